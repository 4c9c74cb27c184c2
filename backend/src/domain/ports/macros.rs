//! Helper macro for declaring port error enums.
//!
//! Each variant becomes a `thiserror` variant with the given message, plus a
//! snake_case constructor whose parameters accept `impl Into<FieldType>`:
//!
//! ```text
//! define_port_error! {
//!     pub enum ItemRepositoryError {
//!         Connection { message: String } => "connection failed: {message}",
//!     }
//! }
//! ItemRepositoryError::connection("pool exhausted");
//! ```

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = "Construct the `" $variant "` variant."]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = "Construct the `" $variant "` variant."]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum SamplePortError {
            Unreachable => "peer unreachable",
            Query { message: String } => "query failed: {message}",
            Rejected { status: u16, message: String } => "rejected with {status}: {message}",
        }
    }

    #[test]
    fn unit_variants_get_plain_constructors() {
        assert_eq!(SamplePortError::unreachable().to_string(), "peer unreachable");
    }

    #[test]
    fn field_constructors_accept_conversions() {
        let error = SamplePortError::query("timeout");
        assert_eq!(error, SamplePortError::Query { message: "timeout".to_owned() });
    }

    #[test]
    fn mixed_fields_render_in_message() {
        let error = SamplePortError::rejected(409_u16, "stale");
        assert_eq!(error.to_string(), "rejected with 409: stale");
    }
}
