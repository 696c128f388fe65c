use super::stream::{StubInputStream, StubOutputStream};
use crate::error::{Result, StubError};
use crate::model::{
    ClassId, ClassStub, FileStub, FunctionStub, ObjectStub, PropertyDelegateStub, PropertyStub,
    TypeArgument, TypeBean, UnderlyingTypes, ValueClassRepresentation, Variance,
};

/// Field-level encoding of one stub payload.
///
/// `deserialize` must read exactly what `serialize` wrote, in the same order.
pub trait StubSerializer: Sized {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()>;
    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self>;
}

impl StubSerializer for FileStub {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()> {
        out.write_name(self.package_fq_name.as_ref())
    }

    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self> {
        Ok(FileStub {
            package_fq_name: input.read_name()?,
        })
    }
}

impl StubSerializer for ClassStub {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()> {
        out.write_name(self.name.as_ref())?;
        out.write_name(self.fq_name.as_ref())?;
        write_class_id(out, self.class_id.as_ref())?;
        out.write_bool(self.is_interface)?;
        out.write_bool(self.is_enum_entry)?;
        out.write_bool(self.is_local)?;
        out.write_bool(self.is_top_level)?;
        out.write_names(&self.super_names)?;
        write_value_class(out, self.value_class.as_ref())
    }

    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self> {
        Ok(ClassStub {
            name: input.read_name()?,
            fq_name: input.read_name()?,
            class_id: read_class_id(input)?,
            is_interface: input.read_bool()?,
            is_enum_entry: input.read_bool()?,
            is_local: input.read_bool()?,
            is_top_level: input.read_bool()?,
            super_names: input.read_names()?,
            value_class: read_value_class(input)?,
        })
    }
}

impl StubSerializer for ObjectStub {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()> {
        out.write_name(self.name.as_ref())?;
        out.write_name(self.fq_name.as_ref())?;
        out.write_bool(self.is_companion)?;
        out.write_bool(self.is_local)?;
        out.write_bool(self.is_top_level)?;
        out.write_names(&self.super_names)
    }

    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self> {
        Ok(ObjectStub {
            name: input.read_name()?,
            fq_name: input.read_name()?,
            is_companion: input.read_bool()?,
            is_local: input.read_bool()?,
            is_top_level: input.read_bool()?,
            super_names: input.read_names()?,
        })
    }
}

impl StubSerializer for FunctionStub {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()> {
        out.write_name(self.name.as_ref())?;
        out.write_name(self.fq_name.as_ref())?;
        out.write_bool(self.is_top_level)?;
        out.write_bool(self.is_extension)?;
        out.write_bool(self.has_body)
    }

    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self> {
        Ok(FunctionStub {
            name: input.read_name()?,
            fq_name: input.read_name()?,
            is_top_level: input.read_bool()?,
            is_extension: input.read_bool()?,
            has_body: input.read_bool()?,
        })
    }
}

impl StubSerializer for PropertyStub {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()> {
        out.write_name(self.name.as_ref())?;
        out.write_name(self.fq_name.as_ref())?;
        out.write_bool(self.is_var)?;
        out.write_bool(self.is_top_level)?;
        out.write_bool(self.is_extension)?;
        out.write_bool(self.has_initializer)?;
        out.write_bool(self.has_delegate)?;
        out.write_bool(self.has_return_type_ref)
    }

    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self> {
        Ok(PropertyStub {
            name: input.read_name()?,
            fq_name: input.read_name()?,
            is_var: input.read_bool()?,
            is_top_level: input.read_bool()?,
            is_extension: input.read_bool()?,
            has_initializer: input.read_bool()?,
            has_delegate: input.read_bool()?,
            has_return_type_ref: input.read_bool()?,
        })
    }
}

impl StubSerializer for PropertyDelegateStub {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()> {
        out.write_bool(self.has_expression)
    }

    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self> {
        Ok(PropertyDelegateStub {
            has_expression: input.read_bool()?,
        })
    }
}

fn write_class_id(out: &mut StubOutputStream, class_id: Option<&ClassId>) -> Result<()> {
    let Some(class_id) = class_id else {
        return out.write_bool(false);
    };
    out.write_bool(true)?;
    out.write_name(class_id.package.as_ref())?;
    out.write_name(Some(&class_id.relative_name))?;
    out.write_bool(class_id.is_local)
}

fn read_class_id(input: &mut StubInputStream<'_>) -> Result<Option<ClassId>> {
    if !input.read_bool()? {
        return Ok(None);
    }
    Ok(Some(ClassId {
        package: input.read_name()?,
        relative_name: input.read_required_name("relative class name")?,
        is_local: input.read_bool()?,
    }))
}

const VALUE_CLASS_ABSENT: i64 = -1;

/// Value-class layout: a signed count where `-1` marks "not a value class",
/// followed by that many type beans and the inline flag.
fn write_value_class(
    out: &mut StubOutputStream,
    repr: Option<&ValueClassRepresentation>,
) -> Result<()> {
    let Some(repr) = repr else {
        return out.write_signed(VALUE_CLASS_ABSENT);
    };
    out.write_signed(repr.underlying_types.len() as i64)?;
    for bean in &repr.underlying_types {
        bean.serialize(out)?;
    }
    out.write_bool(repr.is_inline)
}

fn read_value_class(input: &mut StubInputStream<'_>) -> Result<Option<ValueClassRepresentation>> {
    let count = input.read_signed()?;
    if count == VALUE_CLASS_ABSENT {
        return Ok(None);
    }
    if count < 0 || count as u64 > input.remaining() as u64 {
        return Err(StubError::corrupt(format!(
            "invalid underlying type count {}",
            count
        )));
    }

    let mut underlying_types = UnderlyingTypes::with_capacity(count as usize);
    for _ in 0..count {
        underlying_types.push(TypeBean::deserialize(input)?);
    }
    Ok(Some(ValueClassRepresentation {
        is_inline: input.read_bool()?,
        underlying_types,
    }))
}

const BEAN_CLASS: u64 = 0;
const BEAN_TYPE_PARAMETER: u64 = 1;
const ARG_STAR: u64 = 0;
const ARG_TYPE: u64 = 1;

impl StubSerializer for TypeBean {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()> {
        match self {
            TypeBean::Class {
                class_id,
                arguments,
                nullable,
            } => {
                out.write_varint(BEAN_CLASS)?;
                out.write_name(Some(class_id))?;
                out.write_varint(arguments.len() as u64)?;
                for arg in arguments {
                    arg.serialize(out)?;
                }
                out.write_bool(*nullable)
            }
            TypeBean::TypeParameter { name, nullable } => {
                out.write_varint(BEAN_TYPE_PARAMETER)?;
                out.write_name(Some(name))?;
                out.write_bool(*nullable)
            }
        }
    }

    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self> {
        input.descend()?;
        let bean = match input.read_varint()? {
            BEAN_CLASS => {
                let class_id = input.read_required_name("class id")?;
                let count = input.read_count("type argument")?;
                let mut arguments = Vec::with_capacity(count);
                for _ in 0..count {
                    arguments.push(TypeArgument::deserialize(input)?);
                }
                TypeBean::Class {
                    class_id,
                    arguments,
                    nullable: input.read_bool()?,
                }
            }
            BEAN_TYPE_PARAMETER => TypeBean::TypeParameter {
                name: input.read_required_name("type parameter")?,
                nullable: input.read_bool()?,
            },
            tag => return Err(StubError::corrupt(format!("unknown type bean tag {}", tag))),
        };
        input.ascend();
        Ok(bean)
    }
}

impl StubSerializer for TypeArgument {
    fn serialize(&self, out: &mut StubOutputStream) -> Result<()> {
        match self {
            TypeArgument::Star => out.write_varint(ARG_STAR),
            TypeArgument::Type { variance, bean } => {
                out.write_varint(ARG_TYPE)?;
                out.write_varint(variance_tag(*variance))?;
                bean.serialize(out)
            }
        }
    }

    fn deserialize(input: &mut StubInputStream<'_>) -> Result<Self> {
        match input.read_varint()? {
            ARG_STAR => Ok(TypeArgument::Star),
            ARG_TYPE => {
                let variance = match input.read_varint()? {
                    0 => Variance::Invariant,
                    1 => Variance::In,
                    2 => Variance::Out,
                    tag => {
                        return Err(StubError::corrupt(format!("unknown variance {}", tag)));
                    }
                };
                Ok(TypeArgument::Type {
                    variance,
                    bean: TypeBean::deserialize(input)?,
                })
            }
            tag => Err(StubError::corrupt(format!(
                "unknown type argument tag {}",
                tag
            ))),
        }
    }
}

fn variance_tag(variance: Variance) -> u64 {
    match variance {
        Variance::Invariant => 0,
        Variance::In => 1,
        Variance::Out => 2,
    }
}
