//! `define_port_error!`: error enums for port traits.
//!
//! Variant fields are always `String`. Each variant gets a snake_case
//! constructor taking `impl Into<String>` per field and an `is_*` predicate,
//! so adapters write `RepositoryError::query(err.to_string())` and callers
//! write `err.is_not_found()`.

macro_rules! define_port_error {
    (@variant $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }

            #[doc = concat!("True for [`Self::", stringify!($variant), "`].")]
            pub fn [<is_ $variant:snake>](&self) -> bool {
                matches!(self, Self::$variant)
            }
        }
    };

    (@variant $variant:ident { $($field:ident),+ }) => {
        ::paste::paste! {
            #[doc = concat!("Build [`Self::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($field: impl Into<String>),+) -> Self {
                Self::$variant { $($field: $field.into()),+ }
            }

            #[doc = concat!("True for [`Self::", stringify!($variant), "`].")]
            pub fn [<is_ $variant:snake>](&self) -> bool {
                matches!(self, Self::$variant { .. })
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident),+ $(,)? } )? => $message:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field: String),+ } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@variant $variant $( { $($field),+ } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum StoreError {
            Missing => "row missing",
            Broken { message } => "store broken: {message}",
            Conflict { table, constraint } => "{table} violates {constraint}",
        }
    }

    #[test]
    fn unit_variant_has_constructor_and_predicate() {
        assert_eq!(StoreError::missing(), StoreError::Missing);
        assert_eq!(StoreError::missing().to_string(), "row missing");
        assert!(StoreError::missing().is_missing());
        assert!(!StoreError::missing().is_broken());
    }

    #[test]
    fn fields_accept_str_and_string() {
        assert_eq!(StoreError::broken("disk").to_string(), "store broken: disk");
        let err = StoreError::conflict(String::from("apps"), "apps_app_slug_key");
        assert_eq!(err.to_string(), "apps violates apps_app_slug_key");
        assert!(err.is_conflict());
    }
}
