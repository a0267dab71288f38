//! Diesel table definitions. Must match `backend/migrations`.

diesel::table! {
    /// Apps provisioned through the add-on.
    apps (id) {
        id -> Uuid,
        app_slug -> Text,
        plan -> Text,
        api_token -> Text,
        bitrise_api_token -> Text,
        header_color_1 -> Text,
        header_color_2 -> Text,
        encrypted_secret -> Nullable<Bytea>,
        encrypted_secret_iv -> Nullable<Bytea>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One settings row per app.
    app_settings (id) {
        id -> Uuid,
        app_id -> Uuid,
        ios_workflow -> Text,
        android_workflow -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Builds per app and platform.
    app_versions (id) {
        id -> Uuid,
        app_id -> Uuid,
        platform -> Text,
        build_number -> Text,
        build_slug -> Text,
        version -> Text,
        last_update -> Nullable<Timestamptz>,
        app_store_info -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Notification contacts per app.
    app_contacts (id) {
        id -> Uuid,
        app_id -> Uuid,
        email -> Text,
        confirmation_token -> Nullable<Text>,
        confirmed_at -> Nullable<Timestamptz>,
        notification_preferences -> Nullable<Jsonb>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Store screenshots per version.
    screenshots (id) {
        id -> Uuid,
        app_version_id -> Uuid,
        filename -> Text,
        filesize -> Int8,
        device_type -> Text,
        screen_size -> Text,
        uploaded -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(app_settings -> apps (app_id));
diesel::joinable!(app_versions -> apps (app_id));
diesel::joinable!(app_contacts -> apps (app_id));
diesel::joinable!(screenshots -> app_versions (app_version_id));

diesel::allow_tables_to_appear_in_same_query!(
    apps,
    app_settings,
    app_versions,
    app_contacts,
    screenshots,
);
