//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Encrypted items owned by a user.
    ///
    /// Timestamps are stored twice: as `timestamptz` for humans and as
    /// microseconds since the epoch for sync token comparisons.
    items (uuid) {
        uuid -> Uuid,
        user_uuid -> Uuid,
        content -> Nullable<Text>,
        content_type -> Varchar,
        content_size -> Int8,
        enc_item_key -> Nullable<Text>,
        items_key_id -> Nullable<Varchar>,
        auth_hash -> Nullable<Varchar>,
        duplicate_of -> Nullable<Uuid>,
        deleted -> Bool,
        last_user_agent -> Nullable<Text>,
        created_at -> Timestamptz,
        created_at_timestamp -> Int8,
        updated_at -> Timestamptz,
        updated_at_timestamp -> Int8,
    }
}

diesel::table! {
    /// Note snapshots.
    revisions (uuid) {
        uuid -> Uuid,
        item_uuid -> Uuid,
        content -> Nullable<Text>,
        content_type -> Varchar,
        items_key_id -> Nullable<Varchar>,
        enc_item_key -> Nullable<Text>,
        auth_hash -> Nullable<Varchar>,
        /// Day the snapshot was taken, used for history windows.
        creation_date -> Date,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Links revisions to the items that may read them.
    item_revisions (uuid) {
        uuid -> Uuid,
        item_uuid -> Uuid,
        revision_uuid -> Uuid,
    }
}

diesel::joinable!(item_revisions -> revisions (revision_uuid));
diesel::joinable!(item_revisions -> items (item_uuid));

diesel::allow_tables_to_appear_in_same_query!(items, item_revisions, revisions);
