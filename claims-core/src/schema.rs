use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

table! {
    users (id) {
        id -> Text,
        name -> Text,
        email -> Text,
        phone -> Nullable<Text>,
        role -> Text,
        is_active -> Bool,
    }
}

table! {
    damage_reports (id) {
        id -> Text,
        property_name -> Text,
        property_address -> Nullable<Text>,
        damage_type -> Nullable<Text>,
        description -> Nullable<Text>,
        damage_date -> Timestamptz,
        checkout_date -> Nullable<Timestamptz>,
        airbnb_deadline -> Nullable<Timestamptz>,
        proof_deadline -> Nullable<Timestamptz>,
        submitted_to_airbnb -> Bool,
        status -> Text,
        reported_by_id -> Text,
        created_at -> Timestamptz,
    }
}

table! {
    damage_items (id) {
        id -> Text,
        damage_report_id -> Text,
        item_name -> Text,
        created_at -> Timestamptz,
    }
}

table! {
    notifications (id) {
        id -> Text,
        user_id -> Text,
        damage_report_id -> Nullable<Text>,
        notification_type -> Text,
        title -> Text,
        message -> Text,
        is_read -> Bool,
        created_at -> Timestamptz,
        scheduled_for -> Nullable<Timestamptz>,
    }
}

joinable!(damage_reports -> users (reported_by_id));
joinable!(damage_items -> damage_reports (damage_report_id));
joinable!(notifications -> users (user_id));

allow_tables_to_appear_in_same_query!(
    users,
    damage_reports,
    damage_items,
    notifications,
);
