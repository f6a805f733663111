/// Normalize a free-form enum code to the canonical comparison form.
///
/// Upper-cases, strips French accents on `E`/`U`, and maps spaces and hyphens
/// to underscores, so `"Terminé"`, `"TERMINE"` and `"termine"` compare equal.
pub(crate) fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| match c {
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Ù' | 'Û' | 'Ü' => 'U',
            ' ' | '-' => '_',
            other => other,
        })
        .collect()
}
