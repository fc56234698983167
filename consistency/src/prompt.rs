//! Prompt enhancement with entity attributes.

use crate::entity::EntityProfile;

/// Append a description block for each entity to a generation prompt.
///
/// Each entity contributes one line, `"<Kind> <name>: <description> (key: value, ...)"`.
/// Entities with neither a description nor attributes add nothing.
pub fn enhance_prompt(prompt: &str, entities: &[EntityProfile]) -> String {
    let lines: Vec<String> = entities.iter().filter_map(entity_line).collect();

    let prompt = prompt.trim();
    if lines.is_empty() {
        return prompt.to_string();
    }

    let mut enhanced = String::from(prompt);
    if !enhanced.is_empty() {
        enhanced.push_str("\n\n");
    }
    enhanced.push_str("Maintain consistency with these references:");
    for line in lines {
        enhanced.push_str("\n- ");
        enhanced.push_str(&line);
    }
    enhanced
}

fn entity_line(entity: &EntityProfile) -> Option<String> {
    let description = entity.description.trim();
    let attributes: Vec<String> = entity
        .attributes
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| format!("{key}: {}", value.trim()))
        .collect();

    if description.is_empty() && attributes.is_empty() {
        return None;
    }

    let mut line = format!("{} {}", entity.kind.display_name(), entity.name);
    if !description.is_empty() {
        line.push_str(": ");
        line.push_str(description);
    }
    if !attributes.is_empty() {
        line.push_str(" (");
        line.push_str(&attributes.join(", "));
        line.push(')');
    }
    Some(line)
}
