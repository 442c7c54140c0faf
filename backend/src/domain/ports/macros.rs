//! Generates the error enums returned by port adapters.
//!
//! Every port error carries `Connection` and `Query` variants so services can
//! map store outages uniformly; ports add their own variants on top. Each
//! variant gets a snake-case constructor that accepts `impl Into<_>` fields.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            /// The backing store could not be reached.
            #[error("connection failed: {message}")]
            Connection { message: String },
            /// A query or mutation failed while executing.
            #[error("query failed: {message}")]
            Query { message: String },
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field : $ty),* },
            )*
        }

        impl $name {
            /// Build a [`Self::Connection`] error.
            pub fn connection(message: impl Into<String>) -> Self {
                Self::Connection {
                    message: message.into(),
                }
            }

            /// Build a [`Self::Query`] error.
            pub fn query(message: impl Into<String>) -> Self {
                Self::Query {
                    message: message.into(),
                }
            }

            $(
                ::paste::paste! {
                    #[doc = concat!("Build a [`Self::", stringify!($variant), "`] error.")]
                    pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                        Self::$variant { $($field: $field.into()),* }
                    }
                }
            )*
        }
    };
}

pub(crate) use define_port_error;
