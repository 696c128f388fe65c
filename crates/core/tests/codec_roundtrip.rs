use pretty_assertions::assert_eq;
use proptest::prelude::*;
use stubscope_core::codec;
use stubscope_core::model::{
    ClassId, ClassStub, FileStub, FunctionStub, Name, ObjectStub, PropertyDelegateStub,
    PropertyStub, StubData, StubTree, StubTreeBuilder, TypeArgument, TypeBean,
    ValueClassRepresentation, Variance,
};

fn name() -> impl Strategy<Value = Name> {
    "[A-Za-z][A-Za-z0-9]{0,7}".prop_map(Name::from)
}

fn type_bean() -> impl Strategy<Value = TypeBean> {
    let leaf = prop_oneof![
        (name(), any::<bool>())
            .prop_map(|(name, nullable)| TypeBean::TypeParameter { name, nullable }),
        (name(), any::<bool>()).prop_map(|(class_id, nullable)| TypeBean::Class {
            class_id,
            arguments: Vec::new(),
            nullable,
        }),
    ];
    leaf.prop_recursive(3, 12, 3, |inner| {
        let argument = prop_oneof![
            Just(TypeArgument::Star),
            (
                prop_oneof![Just(Variance::Invariant), Just(Variance::In), Just(Variance::Out)],
                inner
            )
                .prop_map(|(variance, bean)| TypeArgument::Type { variance, bean }),
        ];
        (name(), prop::collection::vec(argument, 0..3), any::<bool>()).prop_map(
            |(class_id, arguments, nullable)| TypeBean::Class {
                class_id,
                arguments,
                nullable,
            },
        )
    })
}

fn value_class() -> impl Strategy<Value = Option<ValueClassRepresentation>> {
    prop::option::of(
        (any::<bool>(), prop::collection::vec(type_bean(), 0..3))
            .prop_map(|(is_inline, beans)| ValueClassRepresentation::new(is_inline, beans)),
    )
}

fn class_id() -> impl Strategy<Value = Option<ClassId>> {
    prop::option::of(
        (
            prop::option::of(name()),
            prop::collection::vec(name(), 1..4),
            any::<bool>(),
        )
            .prop_map(|(package, path, is_local)| ClassId {
                package,
                relative_name: Name::from(path.join(".")),
                is_local,
            }),
    )
}

fn stub_data() -> impl Strategy<Value = StubData> {
    let names = || (prop::option::of(name()), prop::option::of(name()));
    prop_oneof![
        (
            names(),
            class_id(),
            prop::collection::vec(name(), 0..3),
            any::<[bool; 4]>(),
            value_class()
        )
            .prop_map(|((name, fq_name), class_id, super_names, flags, value_class)| {
                StubData::Class(ClassStub {
                    name,
                    fq_name,
                    class_id,
                    super_names,
                    is_interface: flags[0],
                    is_enum_entry: flags[1],
                    is_local: flags[2],
                    is_top_level: flags[3],
                    value_class,
                })
            }),
        (names(), prop::collection::vec(name(), 0..2), any::<[bool; 3]>()).prop_map(
            |((name, fq_name), super_names, flags)| StubData::Object(ObjectStub {
                name,
                fq_name,
                super_names,
                is_companion: flags[0],
                is_local: flags[1],
                is_top_level: flags[2],
            })
        ),
        (names(), any::<[bool; 3]>()).prop_map(|((name, fq_name), flags)| {
            StubData::Function(FunctionStub {
                name,
                fq_name,
                is_top_level: flags[0],
                is_extension: flags[1],
                has_body: flags[2],
            })
        }),
        (names(), any::<[bool; 6]>()).prop_map(|((name, fq_name), flags)| {
            StubData::Property(PropertyStub {
                name,
                fq_name,
                is_var: flags[0],
                is_top_level: flags[1],
                is_extension: flags[2],
                has_initializer: flags[3],
                has_delegate: flags[4],
                has_return_type_ref: flags[5],
            })
        }),
        any::<bool>().prop_map(|has_expression| {
            StubData::PropertyDelegate(PropertyDelegateStub { has_expression })
        }),
    ]
}

/// Builds a tree by attaching each generated payload to some node on the
/// open rightmost path, dropping payloads no open node may contain.
fn stub_tree() -> impl Strategy<Value = StubTree> {
    (
        prop::option::of(name()),
        prop::collection::vec((any::<usize>(), stub_data()), 0..40),
    )
        .prop_map(|(package, nodes)| {
            let mut builder = StubTreeBuilder::new(FileStub {
                package_fq_name: package,
            });
            let mut open = vec![builder.root()];
            for (choice, data) in nodes {
                let depth = choice % open.len();
                let parent = open[depth];
                let parent_kind = builder.kind_of(parent).unwrap();
                if !parent_kind.can_contain(data.kind()) {
                    continue;
                }
                let id = builder.push_child(parent, data).unwrap();
                open.truncate(depth + 1);
                open.push(id);
            }
            builder.finish()
        })
}

proptest! {
    #[test]
    fn prop_round_trip_preserves_tree(tree in stub_tree()) {
        let bytes = codec::serialize(&tree).unwrap();
        let decoded = codec::deserialize(&bytes).unwrap();
        prop_assert_eq!(&decoded, &tree);
        prop_assert_eq!(codec::serialize(&decoded).unwrap(), bytes);
    }

    #[test]
    fn prop_truncation_is_never_accepted(tree in stub_tree(), cut in any::<prop::sample::Index>()) {
        let bytes = codec::serialize(&tree).unwrap();
        let cut = cut.index(bytes.len());
        let err = codec::deserialize(&bytes[..cut]).unwrap_err();
        prop_assert!(err.is_corrupt());
    }
}

#[test]
fn test_value_class_states_survive() {
    let mut builder = StubTreeBuilder::new(FileStub {
        package_fq_name: Some("money".into()),
    });
    let root = builder.root();
    let states = [
        None,
        Some(ValueClassRepresentation::new(true, Vec::new())),
        Some(ValueClassRepresentation::inline(TypeBean::class("kotlin/Long"))),
        Some(ValueClassRepresentation::new(
            false,
            [TypeBean::class("kotlin/Int"), TypeBean::class("kotlin/String").nullable()],
        )),
    ];
    for (i, state) in states.iter().enumerate() {
        builder
            .push_child(
                root,
                ClassStub {
                    name: Some(format!("V{}", i).into()),
                    value_class: state.clone(),
                    ..Default::default()
                },
            )
            .unwrap();
    }
    let tree = builder.finish();

    let decoded = codec::deserialize(&codec::serialize(&tree).unwrap()).unwrap();
    let decoded_states: Vec<_> = decoded
        .root()
        .children()
        .map(|c| c.value_class().cloned())
        .collect();
    assert_eq!(decoded_states, states.to_vec());
}

#[test]
fn test_repeated_names_are_written_once() {
    let build = |count: usize| {
        let mut builder = StubTreeBuilder::new(FileStub::default());
        let root = builder.root();
        for _ in 0..count {
            builder
                .push_child(
                    root,
                    FunctionStub {
                        name: Some("computeInterestRate".into()),
                        fq_name: Some("computeInterestRate".into()),
                        is_top_level: true,
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        codec::serialize(&builder.finish()).unwrap()
    };

    let one = build(1).len();
    let many = build(10).len();
    // later occurrences are back-references, far shorter than the literal
    assert!(many - one < 9 * "computeInterestRate".len());
}
