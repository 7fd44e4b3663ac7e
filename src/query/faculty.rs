/// Faculty keywords and their short codes, matched in this order.
///
/// The first keyword contained in the lowercased faculty text wins, so a
/// broader keyword listed earlier shadows a more specific one listed later.
pub const FACULTY_MAPPING: &[(&str, &str)] = &[
    ("информатика", "ИУ"),
    ("информационные технологии", "ИУ"),
    ("программирование", "ИУ"),
    ("бизнес", "ИБМ"),
    ("менеджмент", "ИБМ"),
    ("машиностроение", "МТ"),
    ("специальное машиностроение", "СМ"),
    ("биомедицина", "БМТ"),
    ("радиоэлектроника", "РЛ"),
    ("энергомашиностроение", "Э"),
    ("робототехника", "РК"),
    ("фундаментальные науки", "ФН"),
    ("лингвистика", "Л"),
    ("безопасность", "ЮР"),
    ("гуманитарные науки", "СГН"),
];

/// Resolve free-text faculty name to its short code.
pub fn resolve_faculty_code(faculty: &str) -> Option<&'static str> {
    let lower = faculty.to_lowercase();
    FACULTY_MAPPING
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, code)| *code)
}
