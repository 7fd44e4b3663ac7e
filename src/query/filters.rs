use crate::models::{Course, FilterSet, ParsedQuery, UserType};

/// Purpose labels the provider may return for "тип пользователя".
pub const USER_TYPE_MAPPING: &[(&str, UserType)] = &[
    ("Поиск участников для проекта", UserType::ProjectCreator),
    ("Участие в существующих проектах", UserType::ProjectParticipant),
    ("Расширение профессиональных контактов", UserType::Networker),
];

/// Map a purpose label to its user type. Unknown labels map to nothing.
pub fn user_type_for_label(label: &str) -> Option<UserType> {
    USER_TYPE_MAPPING
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, user_type)| *user_type)
}

/// Render a course the way the `users.course` column stores it.
pub fn course_filter_value(course: &Course) -> String {
    match course {
        Course::Number(n) => format!("{n} курс"),
        Course::Text(text) => text.clone(),
    }
}

/// Translate a parsed query into exact-match predicates for the user store.
///
/// Skills are not part of the filter set. The raw faculty name is never
/// used; only a resolved faculty code is.
pub fn build_filters(parsed: &ParsedQuery) -> FilterSet {
    FilterSet {
        course: parsed.course.as_ref().map(course_filter_value),
        user_type: parsed.user_type.as_deref().and_then(user_type_for_label),
        faculty: parsed.faculty_code.clone(),
        group_name: parsed.group.clone(),
    }
}
