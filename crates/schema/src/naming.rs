//! Naming helpers for the schema graph
//!
//! Small string utilities used when deriving foreign-key names, plural
//! names, and serialized field names from type and property names.

/// Convert a PascalCase or camelCase name to snake_case
///
/// # Examples
///
/// - "OrderLine" -> "order_line"
/// - "customerId" -> "customer_id"
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_is_upper = false;
    let mut prev_is_underscore = true;

    for (i, c) in s.chars().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !prev_is_underscore {
                result.push('_');
            }
            prev_is_underscore = true;
            prev_is_upper = false;
        } else if c.is_uppercase() {
            if i > 0 && !prev_is_upper && !prev_is_underscore {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_is_upper = true;
            prev_is_underscore = false;
        } else {
            result.push(c.to_ascii_lowercase());
            prev_is_upper = false;
            prev_is_underscore = false;
        }
    }

    result
}

/// Convert a name to camelCase
///
/// # Examples
///
/// - "OrderLine" -> "orderLine"
/// - "customer_id" -> "customerId"
pub fn to_camel_case(s: &str) -> String {
    let snake = to_snake_case(s);
    let mut result = String::with_capacity(snake.len());
    let mut upper_next = false;

    for c in snake.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            result.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Capitalize the first letter of a string
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Simple pluralization (English)
pub fn pluralize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }

    // Handle common irregular plurals
    match s {
        "person" => return "people".to_string(),
        "child" => return "children".to_string(),
        "man" => return "men".to_string(),
        "woman" => return "women".to_string(),
        "foot" => return "feet".to_string(),
        "tooth" => return "teeth".to_string(),
        "goose" => return "geese".to_string(),
        "mouse" => return "mice".to_string(),
        _ => {}
    }

    // Handle words ending in 's', 'x', 'z', 'ch', 'sh'
    if s.ends_with('s')
        || s.ends_with('x')
        || s.ends_with('z')
        || s.ends_with("ch")
        || s.ends_with("sh")
    {
        return format!("{}es", s);
    }

    // Handle words ending in consonant + 'y'
    if s.ends_with('y') {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() >= 2 {
            let before_y = chars[chars.len() - 2];
            if !matches!(before_y, 'a' | 'e' | 'i' | 'o' | 'u') {
                return format!("{}ies", &s[..s.len() - 1]);
            }
        }
    }

    format!("{}s", s)
}

/// Check if a string is a valid identifier for generated code
///
/// Valid identifiers start with a letter or underscore and contain only
/// letters, digits, and underscores.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        None => false,
        Some(first) if !first.is_alphabetic() && first != '_' => false,
        Some(_) => chars.all(|c| c.is_alphanumeric() || c == '_'),
    }
}
