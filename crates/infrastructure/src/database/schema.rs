// Database schema for the users collection
diesel::table! {
    users (id) {
        id -> Text,                          // store-assigned document id
        email -> Text,
        username -> Text,
        first_name -> Nullable<Text>,
        last_name -> Nullable<Text>,
        role -> Text,                        // admin, user, moderator
        profile_image_url -> Nullable<Text>,
        is_active -> Bool,
        last_login -> Nullable<Timestamp>,
        created_at -> Nullable<Timestamp>,
        updated_at -> Nullable<Timestamp>,
    }
}
