/// Output rules for the model. Shared by the system prompt and the MCP instructions.
pub const RULES: &str = "\
1. Reply with ONE JSON object of the form {\"code\": \"<mermaid markup>\"} and nothing else.\n\
2. Use ONLY double quotes, for keys and for string values.\n\
3. Escape every newline inside the markup as \\n so the object fits on a single line.\n\
4. Escape double quotes that appear inside the markup as \\\".\n\
5. Never use markdown formatting or code fences.\n\
6. The markup must start with one of the supported diagram keywords, exactly as written \
in the examples (e.g. `graph TD`, `classDiagram`, `stateDiagram-v2`).\n\
7. Class members go inside braces: `class Account {\\n  +balance: double\\n}`, never \
`class Account+balance: double`.\n\
8. Always output STRICT JSON with proper syntax as shown in the examples.";

/// One line per supported keyword, for tool listings.
pub fn keyword_list() -> String {
    crate::DiagramKind::ALL
        .iter()
        .map(|k| k.keyword())
        .collect::<Vec<_>>()
        .join("\n")
}
