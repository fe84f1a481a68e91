//! Markers for the coordinate space a value lives in.

use std::ops::Deref;

macro_rules! coordinate_space {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name<T>(pub T);

        impl<T> Deref for $name<T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.0
            }
        }
    };
}

coordinate_space!(
    /// A value measured in pixels of its owning image.
    Pixel
);

coordinate_space!(
    /// A value measured as a fraction of a reference frame, usually in `[0, 1]`.
    Ratio
);
