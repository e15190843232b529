//! # Scalar Columns
//!
//! One contiguous vector per declared field. Every element type is `Pod`, so
//! a column's live prefix can be handed out as raw bytes for bulk upload.

use std::fmt;

use bytemuck::Pod;

/// Element type that can be stored in a column.
///
/// Implemented for every primitive listed in [`ScalarType`].
pub trait Scalar: Pod + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The matching runtime type tag.
    const TYPE: ScalarType;

    /// Wraps the value in a [`Value`].
    fn into_value(self) -> Value;

    /// Unwraps a [`Value`] of the matching type.
    fn from_value(value: Value) -> Option<Self>;

    /// Borrows the column's storage if it holds this type.
    fn slice(column: &Column) -> Option<&[Self]>;

    /// Mutably borrows the column's storage if it holds this type.
    fn slice_mut(column: &mut Column) -> Option<&mut [Self]>;
}

macro_rules! scalar_types {
    ($($variant:ident => $ty:ty, $name:literal;)+) => {
        /// Runtime tag for a column's element type.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ScalarType {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl ScalarType {
            /// Rust spelling of the type.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            /// Size of one element in bytes.
            #[must_use]
            pub const fn size_of(self) -> usize {
                match self {
                    $(Self::$variant => std::mem::size_of::<$ty>(),)+
                }
            }
        }

        /// A single cell value.
        #[derive(Clone, Copy, Debug, PartialEq)]
        pub enum Value {
            $(
                #[doc = concat!("A `", $name, "` value.")]
                $variant($ty),
            )+
        }

        impl Value {
            /// Type tag of this value.
            #[must_use]
            pub const fn scalar_type(self) -> ScalarType {
                match self {
                    $(Self::$variant(_) => ScalarType::$variant,)+
                }
            }

            /// The zero value of a type. New columns are zero-filled.
            #[must_use]
            pub const fn zero(ty: ScalarType) -> Self {
                match ty {
                    $(ScalarType::$variant => Self::$variant(0 as $ty),)+
                }
            }
        }

        impl fmt::Display for Value {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant(v) => write!(f, "{v}"),)+
                }
            }
        }

        /// Owned storage for one field, allocated to the table's capacity.
        #[derive(Clone, Debug)]
        pub enum Column {
            $(
                #[doc = concat!("A column of `", $name, "`.")]
                $variant(Vec<$ty>),
            )+
        }

        impl Column {
            /// Allocates a zero-filled column of `len` slots.
            #[must_use]
            pub fn with_len(ty: ScalarType, len: usize) -> Self {
                match ty {
                    $(ScalarType::$variant => Self::$variant(vec![0 as $ty; len]),)+
                }
            }

            /// Type tag of the elements.
            #[must_use]
            pub fn scalar_type(&self) -> ScalarType {
                match self {
                    $(Self::$variant(_) => ScalarType::$variant,)+
                }
            }

            /// Allocated slot count (live and stale).
            #[must_use]
            pub fn allocated(&self) -> usize {
                match self {
                    $(Self::$variant(v) => v.len(),)+
                }
            }

            /// Reallocates to exactly `len` slots, keeping the common prefix.
            pub fn resize(&mut self, len: usize) {
                match self {
                    $(Self::$variant(v) => {
                        v.resize(len, 0 as $ty);
                        v.shrink_to_fit();
                    })+
                }
            }

            /// Copies the element at `from` over the element at `to`.
            #[inline]
            pub fn copy_within(&mut self, from: usize, to: usize) {
                match self {
                    $(Self::$variant(v) => v[to] = v[from],)+
                }
            }

            /// Reads the element at `index`.
            #[inline]
            #[must_use]
            pub fn read(&self, index: usize) -> Value {
                match self {
                    $(Self::$variant(v) => Value::$variant(v[index]),)+
                }
            }

            /// Writes `value` at `index`.
            ///
            /// # Errors
            ///
            /// Returns the value's type if it does not match the column.
            #[inline]
            pub fn write(&mut self, index: usize, value: Value) -> Result<(), ScalarType> {
                match (self, value) {
                    $((Self::$variant(v), Value::$variant(x)) => {
                        v[index] = x;
                        Ok(())
                    })+
                    (_, other) => Err(other.scalar_type()),
                }
            }

            /// Raw bytes of the first `len` elements.
            #[must_use]
            pub fn as_bytes(&self, len: usize) -> &[u8] {
                match self {
                    $(Self::$variant(v) => bytemuck::cast_slice(&v[..len]),)+
                }
            }
        }

        $(
            impl Scalar for $ty {
                const TYPE: ScalarType = ScalarType::$variant;

                #[inline]
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                #[inline]
                fn from_value(value: Value) -> Option<Self> {
                    if let Value::$variant(x) = value {
                        Some(x)
                    } else {
                        None
                    }
                }

                #[inline]
                fn slice(column: &Column) -> Option<&[Self]> {
                    if let Column::$variant(v) = column {
                        Some(v.as_slice())
                    } else {
                        None
                    }
                }

                #[inline]
                fn slice_mut(column: &mut Column) -> Option<&mut [Self]> {
                    if let Column::$variant(v) = column {
                        Some(v.as_mut_slice())
                    } else {
                        None
                    }
                }
            }

            impl From<$ty> for Value {
                #[inline]
                fn from(x: $ty) -> Self {
                    Value::$variant(x)
                }
            }
        )+
    };
}

scalar_types! {
    I8 => i8, "i8";
    I16 => i16, "i16";
    I32 => i32, "i32";
    I64 => i64, "i64";
    U8 => u8, "u8";
    U16 => u16, "u16";
    U32 => u32, "u32";
    U64 => u64, "u64";
    F32 => f32, "f32";
    F64 => f64, "f64";
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Extracts a typed scalar, `None` on type mismatch.
    #[inline]
    #[must_use]
    pub fn get<T: Scalar>(self) -> Option<T> {
        T::from_value(self)
    }
}

/// Borrowed view of a column's live prefix.
#[derive(Clone, Copy, Debug)]
pub struct ColumnRef<'a> {
    column: &'a Column,
    len: usize,
}

impl<'a> ColumnRef<'a> {
    pub(crate) fn new(column: &'a Column, len: usize) -> Self {
        Self { column, len }
    }

    /// Element type.
    #[must_use]
    pub fn scalar_type(&self) -> ScalarType {
        self.column.scalar_type()
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value at a dense index, `None` past the live prefix.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        (index < self.len).then(|| self.column.read(index))
    }

    /// Typed slice of the live prefix, `None` on type mismatch.
    #[must_use]
    pub fn as_slice<T: Scalar>(&self) -> Option<&'a [T]> {
        T::slice(self.column).map(|s| &s[..self.len])
    }

    /// Raw bytes of the live prefix.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.column.as_bytes(self.len)
    }

    /// Iterates the live values in dense order.
    pub fn iter(&self) -> impl Iterator<Item = Value> + 'a {
        let column = self.column;
        (0..self.len).map(move |i| column.read(i))
    }
}
