//! Shared text types flowing between pipeline stages
//!
//! Each stage consumes the previous stage's value and returns a new one, so
//! these are plain owned newtypes around `String` with no interior mutability.

use std::fmt;

macro_rules! text_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(text: impl Into<String>) -> Self {
                Self(text.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_newtype!(
    /// The document with every script region removed
    MarkupSkeleton
);

text_newtype!(
    /// All script region bodies, joined by [`crate::regions::REGION_SEPARATOR`]
    CodeUnit
);

text_newtype!(
    /// All shader spans found in the code unit, joined by a line break
    ShaderUnit
);

text_newtype!(
    /// The markup skeleton followed by the single packed script region
    FinalDocument
);
