use crate::define_table_with_default_codec;

define_table_with_default_codec!(
    /// A table mapping deposit store keys to their JSON encoded values.
    (DepositKvSchema) String => String
);
