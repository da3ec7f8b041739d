use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum VectorError {
    #[error("Cannot normalize a vector of zero length")]
    ZeroLength,
    #[error("Vector has a non-finite component")]
    NonFinite,
}

/// Numeric component type usable inside a [`Vector3D`].
pub trait Scalar:
    Copy
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Default
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    fn to_f64(self) -> f64;
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_scalar!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

/// Static result type of a binary operation between `Self` and `Rhs`.
///
/// Floating point beats integer, the wider float beats the narrower one, and
/// two integers resolve to the narrowest signed or unsigned type able to hold
/// both ranges. Integers wider than 16 bits combined with `f32` resolve to
/// `f64`, so no operator loses precision silently.
pub trait Promote<Rhs: Scalar>: Scalar {
    type Output: Scalar;

    fn promote(self) -> <Self as Promote<Rhs>>::Output;
    fn promote_rhs(rhs: Rhs) -> <Self as Promote<Rhs>>::Output;
}

macro_rules! promote_self {
    ($($t:ty),*) => {
        $(
            impl Promote<$t> for $t {
                type Output = $t;

                #[inline]
                fn promote(self) -> $t {
                    self
                }

                #[inline]
                fn promote_rhs(rhs: $t) -> $t {
                    rhs
                }
            }
        )*
    };
}

macro_rules! promote_pair {
    ($($a:ty, $b:ty => $o:ty;)*) => {
        $(
            #[allow(clippy::unnecessary_cast)]
            impl Promote<$b> for $a {
                type Output = $o;

                #[inline]
                fn promote(self) -> $o {
                    self as $o
                }

                #[inline]
                fn promote_rhs(rhs: $b) -> $o {
                    rhs as $o
                }
            }

            #[allow(clippy::unnecessary_cast)]
            impl Promote<$a> for $b {
                type Output = $o;

                #[inline]
                fn promote(self) -> $o {
                    self as $o
                }

                #[inline]
                fn promote_rhs(rhs: $a) -> $o {
                    rhs as $o
                }
            }
        )*
    };
}

promote_self!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

promote_pair! {
    i8, i16 => i16;
    i8, i32 => i32;
    i8, i64 => i64;
    i16, i32 => i32;
    i16, i64 => i64;
    i32, i64 => i64;

    u8, u16 => u16;
    u8, u32 => u32;
    u16, u32 => u32;

    i8, u8 => i16;
    i8, u16 => i32;
    i8, u32 => i64;
    i16, u8 => i16;
    i16, u16 => i32;
    i16, u32 => i64;
    i32, u8 => i32;
    i32, u16 => i32;
    i32, u32 => i64;
    i64, u8 => i64;
    i64, u16 => i64;
    i64, u32 => i64;

    f32, f64 => f64;
    f32, i8 => f32;
    f32, i16 => f32;
    f32, u8 => f32;
    f32, u16 => f32;
    f32, i32 => f64;
    f32, u32 => f64;
    f32, i64 => f64;
    f64, i8 => f64;
    f64, i16 => f64;
    f64, i32 => f64;
    f64, i64 => f64;
    f64, u8 => f64;
    f64, u16 => f64;
    f64, u32 => f64;
}

/// An ordered `(x, y, z)` triple with exact, promotion-aware arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vector3D<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Scalar> Vector3D<T> {
    #[inline]
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn x(&self) -> T {
        self.x
    }

    #[inline]
    pub fn y(&self) -> T {
        self.y
    }

    #[inline]
    pub fn z(&self) -> T {
        self.z
    }

    #[inline]
    pub fn set(&mut self, x: T, y: T, z: T) {
        self.x = x;
        self.y = y;
        self.z = z;
    }

    #[inline]
    pub fn set_x(&mut self, x: T) {
        self.x = x;
    }

    #[inline]
    pub fn set_y(&mut self, y: T) {
        self.y = y;
    }

    #[inline]
    pub fn set_z(&mut self, z: T) {
        self.z = z;
    }

    /// Lossless conversion into a wider component type.
    #[inline]
    pub fn widen<U: Scalar + From<T>>(self) -> Vector3D<U> {
        Vector3D::new(U::from(self.x), U::from(self.y), U::from(self.z))
    }

    /// Explicit, possibly lossy, conversion to floating point components.
    #[inline]
    pub fn as_f64(self) -> Vector3D<f64> {
        Vector3D::new(self.x.to_f64(), self.y.to_f64(), self.z.to_f64())
    }

    #[inline]
    pub fn length_squared(&self) -> f64 {
        let v = self.as_f64();
        v.x * v.x + v.y * v.y + v.z * v.z
    }

    /// Euclidean norm. Fails when any component is infinite or NaN.
    pub fn length(&self) -> Result<f64, VectorError> {
        let v = self.as_f64();
        if !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()) {
            return Err(VectorError::NonFinite);
        }
        Ok(self.length_squared().sqrt())
    }

    pub fn normalize(&self) -> Result<Vector3D<f64>, VectorError> {
        let length = self.length()?;
        if length == 0.0 {
            return Err(VectorError::ZeroLength);
        }
        let v = self.as_f64();
        Ok(Vector3D::new(v.x / length, v.y / length, v.z / length))
    }

    pub fn cross<U: Scalar>(self, rhs: Vector3D<U>) -> Vector3D<<T as Promote<U>>::Output>
    where
        T: Promote<U>,
    {
        let (ax, ay, az) = (self.x.promote(), self.y.promote(), self.z.promote());
        let (bx, by, bz) = (
            T::promote_rhs(rhs.x),
            T::promote_rhs(rhs.y),
            T::promote_rhs(rhs.z),
        );
        Vector3D::new(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx)
    }
}

impl<T: Scalar> fmt::Display for Vector3D<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

impl<T, U> Add<Vector3D<U>> for Vector3D<T>
where
    T: Promote<U>,
    U: Scalar,
{
    type Output = Vector3D<<T as Promote<U>>::Output>;

    #[inline]
    fn add(self, rhs: Vector3D<U>) -> Self::Output {
        Vector3D::new(
            self.x.promote() + T::promote_rhs(rhs.x),
            self.y.promote() + T::promote_rhs(rhs.y),
            self.z.promote() + T::promote_rhs(rhs.z),
        )
    }
}

impl<T, U> Sub<Vector3D<U>> for Vector3D<T>
where
    T: Promote<U>,
    U: Scalar,
{
    type Output = Vector3D<<T as Promote<U>>::Output>;

    #[inline]
    fn sub(self, rhs: Vector3D<U>) -> Self::Output {
        Vector3D::new(
            self.x.promote() - T::promote_rhs(rhs.x),
            self.y.promote() - T::promote_rhs(rhs.y),
            self.z.promote() - T::promote_rhs(rhs.z),
        )
    }
}

/// `a * b` between two vectors is the dot product.
impl<T, U> Mul<Vector3D<U>> for Vector3D<T>
where
    T: Promote<U>,
    U: Scalar,
{
    type Output = <T as Promote<U>>::Output;

    #[inline]
    fn mul(self, rhs: Vector3D<U>) -> Self::Output {
        self.x.promote() * T::promote_rhs(rhs.x)
            + self.y.promote() * T::promote_rhs(rhs.y)
            + self.z.promote() * T::promote_rhs(rhs.z)
    }
}

macro_rules! impl_scalar_ops {
    ($($s:ty),*) => {
        $(
            impl<T: Promote<$s>> Mul<$s> for Vector3D<T> {
                type Output = Vector3D<<T as Promote<$s>>::Output>;

                #[inline]
                fn mul(self, rhs: $s) -> Self::Output {
                    let s = T::promote_rhs(rhs);
                    Vector3D::new(self.x.promote() * s, self.y.promote() * s, self.z.promote() * s)
                }
            }

            impl<T: Promote<$s>> Div<$s> for Vector3D<T> {
                type Output = Vector3D<<T as Promote<$s>>::Output>;

                #[inline]
                fn div(self, rhs: $s) -> Self::Output {
                    let s = T::promote_rhs(rhs);
                    Vector3D::new(self.x.promote() / s, self.y.promote() / s, self.z.promote() / s)
                }
            }
        )*
    };
}

impl_scalar_ops!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

impl<T, U> AddAssign<Vector3D<U>> for Vector3D<T>
where
    T: Scalar + From<U>,
    U: Scalar,
{
    #[inline]
    fn add_assign(&mut self, rhs: Vector3D<U>) {
        self.x = self.x + T::from(rhs.x);
        self.y = self.y + T::from(rhs.y);
        self.z = self.z + T::from(rhs.z);
    }
}

impl<T, U> SubAssign<Vector3D<U>> for Vector3D<T>
where
    T: Scalar + From<U>,
    U: Scalar,
{
    #[inline]
    fn sub_assign(&mut self, rhs: Vector3D<U>) {
        self.x = self.x - T::from(rhs.x);
        self.y = self.y - T::from(rhs.y);
        self.z = self.z - T::from(rhs.z);
    }
}

impl<T: Scalar> MulAssign<T> for Vector3D<T> {
    #[inline]
    fn mul_assign(&mut self, rhs: T) {
        self.x = self.x * rhs;
        self.y = self.y * rhs;
        self.z = self.z * rhs;
    }
}

impl<T: Scalar + Neg<Output = T>> Neg for Vector3D<T> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Vector3D::new(-self.x, -self.y, -self.z)
    }
}

// Only lossless conversions exist; narrowing assignment does not compile.
macro_rules! impl_widening {
    ($($from:ty => $($to:ty),+;)*) => {
        $($(
            impl From<Vector3D<$from>> for Vector3D<$to> {
                #[inline]
                fn from(v: Vector3D<$from>) -> Self {
                    v.widen()
                }
            }
        )+)*
    };
}

impl_widening! {
    i8 => i16, i32, i64, f32, f64;
    i16 => i32, i64, f32, f64;
    i32 => i64, f64;
    u8 => u16, u32, i16, i32, i64, f32, f64;
    u16 => u32, i32, i64, f32, f64;
    u32 => i64, f64;
    f32 => f64;
}

impl From<Vector3D<f64>> for nalgebra::Vector3<f64> {
    fn from(v: Vector3D<f64>) -> Self {
        nalgebra::Vector3::new(v.x, v.y, v.z)
    }
}

impl From<nalgebra::Vector3<f64>> for Vector3D<f64> {
    fn from(v: nalgebra::Vector3<f64>) -> Self {
        Vector3D::new(v.x, v.y, v.z)
    }
}

impl From<Vector3D<i32>> for nalgebra::Vector3<i32> {
    fn from(v: Vector3D<i32>) -> Self {
        nalgebra::Vector3::new(v.x, v.y, v.z)
    }
}
