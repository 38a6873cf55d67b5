pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const USER_COUNT_PER_PAGE: i64 = 10;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 10;

/// Valid range for ingredient amounts and cooking times, upper bound exclusive.
pub const QUANTITY_MIN: i32 = 1;
pub const QUANTITY_MAX: i32 = 10_000;

pub const NAME_MAX_LEN: usize = 200;
pub const TEXT_MAX_LEN: usize = 250;

/// Usernames that collide with routing keywords, matched case-insensitively.
pub const RESERVED_USERNAMES: &[&str] = &["me"];

pub const SHOPPING_LIST_HEADER: &str = "Shopping list";
pub const SHOPPING_LIST_CONTENT_TYPE: &str = "text/plain";
pub const SHOPPING_LIST_FILENAME_SUFFIX: &str = "_shopping_list.txt";

pub const USER_ROLES: &[(&str, &str)] = &[
    ("user", "User"),
    ("admin", "Admin"),
];
