//! Diesel table definitions.
//!
//! Kept in sync with the SQL under `backend/migrations`. Hours are stored as
//! integer tenths, preference levels as their -1..=2 codes and work-log
//! statuses as their two-letter codes.

diesel::table! {
    members (id) {
        id -> Uuid,
        member_number -> Text,
        first_name -> Text,
        last_name -> Text,
        email -> Nullable<Text>,
        quota_tenths -> Int4,
        joined_on -> Date,
        board -> Bool,
        active -> Bool,
        notification_pending -> Bool,
        notification_revision -> Int8,
        last_notified_at -> Timestamptz,
    }
}

diesel::table! {
    task_groups (id) {
        id -> Uuid,
        name -> Text,
        owner_id -> Uuid,
        remark -> Text,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        name -> Text,
        group_id -> Uuid,
        required_headcount -> Int4,
        hours_per_person_tenths -> Int4,
        date -> Nullable<Date>,
        owner_id -> Uuid,
        team_lead_id -> Nullable<Uuid>,
        remark -> Text,
    }
}

diesel::table! {
    time_slot_requirements (task_id, hour) {
        task_id -> Uuid,
        hour -> Int2,
        headcount -> Int4,
    }
}

diesel::table! {
    preferences (id) {
        id -> Uuid,
        member_id -> Uuid,
        task_id -> Uuid,
        member_level -> Int2,
        board_level -> Int2,
        remarks -> Text,
        board_remarks -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    assignments (id) {
        id -> Uuid,
        member_id -> Uuid,
        task_id -> Uuid,
        automatic -> Bool,
        extra_helpers -> Int2,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    time_slot_assignments (assignment_id, hour) {
        assignment_id -> Uuid,
        hour -> Int2,
    }
}

diesel::table! {
    work_logs (id) {
        id -> Uuid,
        member_id -> Uuid,
        task_id -> Uuid,
        worked_on -> Date,
        hours_tenths -> Int4,
        status -> Text,
        remark -> Text,
        board_remark -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    mail_outbox (id) {
        id -> Uuid,
        template -> Text,
        recipients -> Array<Uuid>,
        context -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(tasks -> task_groups (group_id));
diesel::joinable!(time_slot_requirements -> tasks (task_id));
diesel::joinable!(preferences -> tasks (task_id));
diesel::joinable!(preferences -> members (member_id));
diesel::joinable!(assignments -> tasks (task_id));
diesel::joinable!(assignments -> members (member_id));
diesel::joinable!(time_slot_assignments -> assignments (assignment_id));
diesel::joinable!(work_logs -> tasks (task_id));
diesel::joinable!(work_logs -> members (member_id));

diesel::allow_tables_to_appear_in_same_query!(
    members,
    task_groups,
    tasks,
    time_slot_requirements,
    preferences,
    assignments,
    time_slot_assignments,
    work_logs,
    mail_outbox,
);
