/// Default persona prepended to the system prompt.
pub const DEFAULT_PERSONALITY: &str = "Have a fun and joking personality, like a comedian, but also detailed and easy to understand in explaining concepts.";

const RESPONSE_FORMAT: &str = r#"
Return the name, description, numbered steps instruction (in a fun way), connection, code, and components in the following JSON format:
{
    "name": "xxx",
    "description": "xxx",
    "instruction": "xxx",
    "connections": "xxx",
    "components": "xxx",
    "code": "xxx"
}

The components value will be an array of all the components used for the build. Multiple of the same component would each take an index.
Connections will be an array data type not numbered showing the connections, in the exact format of "component;(connector name)$component;(connector name)", with each wire connection separate.
The Component is the same name as the input component name, unless there is duplicate then just add a number behind the component name.

The wire position, connector name, and name of object will be specific and in short form (use symbols when applicable, ex positive to +) (Use short form for connector name when applicable, ex Digital Pin 5 to D5) (Use common labeling convention).
In instruction refer to all the wire connections in the same format as the connection section.
The instructions will be an array data type, with each index being a step.
Use the available tools to get component information and project templates to enhance your response.
Output Must Be a pure JSON.
"#;

/// User turn listing the materials exactly as given; repeated names stay repeated.
pub fn build_materials_query<S: AsRef<str>>(materials: &[S]) -> String {
    if materials.is_empty() {
        tracing::warn!("⚠️ Building a project query with no materials");
    }

    let listed = materials
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Given ONLY the following materials: {}.\nReturn a JSON object of the best project to work on with the name, description, instruction, connection, and components.",
        listed
    )
}

pub fn system_prompt(personality: Option<&str>) -> String {
    let personality = personality
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_PERSONALITY);
    format!("{}{}", personality, RESPONSE_FORMAT)
}
