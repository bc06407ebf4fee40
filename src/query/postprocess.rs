use once_cell::sync::Lazy;
use regex::Regex;

/// Matches "**Explanation:**", "Explanation:", "EXPLANATION:" and similar
static EXPLANATION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\*\*)?\s*explanation\s*:").expect("valid regex"));

/// Markdown fence markers, with or without a language tag
static FENCE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?i:cypher)?").expect("valid regex"));

static CYPHER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcypher\s*:").expect("valid regex"));

/// Strip everything that is not Cypher from a raw model completion
pub fn clean_cypher(raw: &str) -> String {
    let mut text = match EXPLANATION_MARKER.find(raw) {
        Some(m) => &raw[..m.start()],
        None => raw,
    }
    .to_string();

    text = FENCE_MARKER.replace_all(&text, "").into_owned();

    if let Some(m) = CYPHER_LABEL.find(&text) {
        text = text[m.end()..].to_string();
    }

    text = text.replace("\\n", "\n");

    text.trim_matches(|c: char| c == '`' || c.is_whitespace())
        .to_string()
}

/// Split cleaned Cypher into statements on `;` outside string literals
/// and `//` line comments
pub fn split_statements(cypher: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    let mut chars = cypher.chars().peekable();
    while let Some(c) = chars.next() {
        if quote.is_none() && c == '/' && chars.peek() == Some(&'/') {
            // line comment: quotes and `;` inside it are inert
            current.push(c);
            for c in chars.by_ref() {
                current.push(c);
                if c == '\n' {
                    break;
                }
            }
            continue;
        }

        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            ';' => {
                push_statement(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_fences_and_explanation() {
        let raw = "```cypher\nMATCH (p:Player) RETURN p.name\n```\n\n**Explanation:**\n\nThis query lists players.";
        assert_eq!(clean_cypher(raw), "MATCH (p:Player) RETURN p.name");
    }

    #[test]
    fn test_strips_plain_explanation_variants() {
        for marker in ["Explanation:", "EXPLANATION:", "**Explanation:**"] {
            let raw = format!("MATCH (t:Tile) RETURN t\n{} the query returns tiles", marker);
            let cleaned = clean_cypher(&raw);
            assert_eq!(cleaned, "MATCH (t:Tile) RETURN t");
        }
    }

    #[test]
    fn test_strips_cypher_label() {
        let raw = "Cypher: MATCH (h:Harbor) RETURN h";
        assert_eq!(clean_cypher(raw), "MATCH (h:Harbor) RETURN h");
    }

    #[test]
    fn test_normalizes_escaped_newlines() {
        let raw = "MATCH (p:Player)\\nRETURN p";
        assert_eq!(clean_cypher(raw), "MATCH (p:Player)\nRETURN p");
    }

    #[test]
    fn test_bare_backticks_trimmed() {
        assert_eq!(clean_cypher("`MATCH (n) RETURN n`"), "MATCH (n) RETURN n");
    }

    #[test]
    fn test_prose_only_output_is_empty() {
        assert_eq!(clean_cypher("```\n```\nExplanation: nothing to do"), "");
    }

    #[test]
    fn test_split_single_statement_with_trailing_semicolon() {
        let statements = split_statements("MATCH (p:Player) RETURN p;");
        assert_eq!(statements, vec!["MATCH (p:Player) RETURN p"]);
    }

    #[test]
    fn test_split_multiple_statements() {
        let statements = split_statements(
            "MATCH (p:Player) RETURN p;\nMATCH (r:Road) RETURN count(r);",
        );
        assert_eq!(
            statements,
            vec!["MATCH (p:Player) RETURN p", "MATCH (r:Road) RETURN count(r)"]
        );
    }

    #[test]
    fn test_split_ignores_semicolons_in_strings() {
        let statements =
            split_statements(r#"MATCH (c:Comment) WHERE c.text CONTAINS "GG; wp" RETURN c"#);
        assert_eq!(statements.len(), 1);

        let statements = split_statements(r"MATCH (c) WHERE c.t = 'it\'s;' RETURN c; RETURN 1");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1], "RETURN 1");
    }

    #[test]
    fn test_split_skips_line_comments() {
        let statements = split_statements(
            "MATCH (p:Player) // don't count bots\nRETURN p;\nMATCH (r:Road) RETURN r",
        );
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("MATCH (p:Player)"));
        assert!(statements[0].ends_with("RETURN p"));
        assert_eq!(statements[1], "MATCH (r:Road) RETURN r");

        let statements = split_statements("MATCH (p:Player) RETURN p // first; second\nLIMIT 1");
        assert_eq!(statements.len(), 1);
    }
}
