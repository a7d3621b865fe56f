//! Operator boilerplate for single-field integer newtypes.
//!
//! ```rust,ignore
//! op!(binary Wei, Add, add, saturating_add);
//! op!(inplace Wei, AddAssign, add_assign, saturating_add);
//! ```
//!
//! The last argument names the method on the inner integer that performs the operation, so callers choose between
//! wrapping, checked-into-saturating, or plain arithmetic.

#[macro_export]
macro_rules! op {
    (binary $unit:ty, $trait:ident, $method:ident, $inner:ident) => {
        impl std::ops::$trait for $unit {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(self.0.$inner(rhs.0))
            }
        }
    };
    (inplace $unit:ty, $trait:ident, $method:ident, $inner:ident) => {
        impl std::ops::$trait for $unit {
            fn $method(&mut self, rhs: Self) {
                self.0 = self.0.$inner(rhs.0);
            }
        }
    };
}
