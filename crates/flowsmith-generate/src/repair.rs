//! Dialect-specific fixes for mistakes the model makes over and over.
//!
//! Every rule is a pure `&str -> String` function and is idempotent.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use flowsmith_core::DiagramKind;

static CLASS_MEMBERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(class\s+\w+)([+\-#].+)$").expect("class member pattern compiles")
});
static QUADRANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(quadrant)\s+(\d+):").expect("quadrant pattern compiles"));
static SANKEY_ARROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*-->\s*|\s*--\s*").expect("sankey arrow pattern compiles"));
static AXIS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(xAxis|yAxis)\s+label:").expect("axis label pattern compiles"));
static OPEN_BRACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\s*").expect("open brace pattern compiles"));
static CLOSE_BRACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\}").expect("close brace pattern compiles"));

/// Apply the repair for whatever dialect `code` starts with.
pub fn repair(code: &str) -> String {
    match DiagramKind::from_prefix(code) {
        Some(kind) => repair_kind(kind, code),
        None => code.to_string(),
    }
}

pub fn repair_kind(kind: DiagramKind, code: &str) -> String {
    match kind {
        DiagramKind::ClassDiagram => fix_class_diagram(code),
        DiagramKind::QuadrantChart => fix_quadrant_chart(code),
        DiagramKind::Sankey => fix_sankey(code),
        DiagramKind::Journey => fix_journey(code),
        DiagramKind::XyChart => fix_xy_chart(code),
        DiagramKind::RequirementDiagram => fix_requirement_diagram(code),
        DiagramKind::Graph
        | DiagramKind::SequenceDiagram
        | DiagramKind::ErDiagram
        | DiagramKind::Gantt
        | DiagramKind::Mindmap
        | DiagramKind::StateDiagramV2
        | DiagramKind::Timeline
        | DiagramKind::GitGraph
        | DiagramKind::C4Context
        | DiagramKind::Flowchart
        | DiagramKind::Pie => code.to_string(),
    }
}

/// `class BankAccount+accountNumber: string` becomes a braced block with the
/// member on its own indented line.
pub fn fix_class_diagram(code: &str) -> String {
    CLASS_MEMBERS
        .replace_all(code, |caps: &Captures| {
            let line = &caps[0];
            if line.contains('{') {
                line.to_string()
            } else {
                format!("{} {{\n  {}\n}}", &caps[1], &caps[2])
            }
        })
        .into_owned()
}

/// `quadrant 1:` becomes `quadrant1:`.
pub fn fix_quadrant_chart(code: &str) -> String {
    QUADRANT.replace_all(code, "${1}${2}:").into_owned()
}

/// One space on each side of `-->` and of a bare `--`.
pub fn fix_sankey(code: &str) -> String {
    SANKEY_ARROW
        .replace_all(code, |caps: &Captures| {
            if caps[0].contains("-->") {
                " --> "
            } else {
                " -- "
            }
        })
        .into_owned()
}

/// Steps must read `<step>: <score>: <actor>`. Extra colons belong to the step text.
pub fn fix_journey(code: &str) -> String {
    code.lines()
        .map(|line| {
            let indented = line.starts_with(char::is_whitespace) && !line.trim().is_empty();
            if !indented || line.matches(':').count() <= 2 {
                return line.to_string();
            }
            let parts: Vec<&str> = line.split(':').collect();
            let n = parts.len();
            let step = parts[..n - 2].join(":");
            format!(
                "{}: {}: {}",
                step.trim(),
                parts[n - 2].trim(),
                parts[n - 1].trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `xAxis   label:` becomes `xAxis label:`.
pub fn fix_xy_chart(code: &str) -> String {
    AXIS_LABEL.replace_all(code, "${1} label:").into_owned()
}

/// Every `{` ends its line and every `}` starts one.
pub fn fix_requirement_diagram(code: &str) -> String {
    let opened = OPEN_BRACE.replace_all(code, "{\n  ");
    CLOSE_BRACE.replace_all(&opened, "\n}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_idempotent(rule: fn(&str) -> String, input: &str) {
        let once = rule(input);
        assert_eq!(rule(&once), once, "not idempotent for {input:?}");
    }

    #[test]
    fn class_members_get_wrapped_in_braces() {
        assert_eq!(
            fix_class_diagram("classDiagram\nclass BankAccount+accountNumber: string"),
            "classDiagram\nclass BankAccount {\n  +accountNumber: string\n}"
        );
        assert_eq!(
            fix_class_diagram("classDiagram\nclass Vault-secret: string\nclass Log#write()"),
            "classDiagram\nclass Vault {\n  -secret: string\n}\nclass Log {\n  #write()\n}"
        );
    }

    #[test]
    fn class_lines_with_braces_are_untouched() {
        let code = "classDiagram\nclass Account+{ balance }\nclass Bank {\n  +name: string\n}";
        assert_eq!(fix_class_diagram(code), code);
        assert_idempotent(fix_class_diagram, "classDiagram\nclass A+x: int\nclass B-y: int");
    }

    #[test]
    fn quadrant_number_is_joined() {
        assert_eq!(fix_quadrant_chart("quadrant 1: Expand"), "quadrant1: Expand");
        assert_eq!(fix_quadrant_chart("quadrant \t 3:"), "quadrant3:");
        assert_eq!(fix_quadrant_chart("quadrant12:"), "quadrant12:");
        assert_eq!(fix_quadrant_chart("quadrant-1 We should expand"), "quadrant-1 We should expand");
        assert_idempotent(fix_quadrant_chart, "quadrantChart\n quadrant 1: a\n quadrant  2: b");
    }

    #[test]
    fn sankey_arrows_are_spaced() {
        assert_eq!(fix_sankey("A--B"), "A -- B");
        assert_eq!(fix_sankey("A  -->  B"), "A --> B");
        assert_eq!(fix_sankey("A-->B"), "A --> B");
        assert_eq!(
            fix_sankey("sankey\n    A[Source] --100-->B[Sink]"),
            "sankey\n    A[Source] -- 100 --> B[Sink]"
        );
        assert_idempotent(fix_sankey, "sankey\n    A -- 100 --> B\n    B--60-->C");
    }

    #[test]
    fn journey_steps_keep_only_two_trailing_fields() {
        let code = "journey\n    title Onboarding\n    section Sign up\n      Read: the docs: 5: User";
        assert_eq!(
            fix_journey(code),
            "journey\n    title Onboarding\n    section Sign up\nRead: the docs: 5: User"
        );
        assert_eq!(
            fix_journey("journey\n  Step:one:two : 3 :  Me  "),
            "journey\nStep:one:two: 3: Me"
        );
    }

    #[test]
    fn journey_lines_with_two_colons_pass_through() {
        let code = "journey\n    title T\n      Fill Form: 3: User\nTop: level: line: x";
        assert_eq!(fix_journey(code), code);
        assert_idempotent(fix_journey, "journey\n      A: b: c: d\n      E: 1: F");
    }

    #[test]
    fn axis_labels_are_tightened() {
        assert_eq!(
            fix_xy_chart("xyChart\n    xAxis    label: \"Time\"\n    yAxis\tlabel: \"Value\""),
            "xyChart\n    xAxis label: \"Time\"\n    yAxis label: \"Value\""
        );
        assert_idempotent(fix_xy_chart, "xyChart\n xAxis   label: a");
    }

    #[test]
    fn requirement_braces_get_their_own_lines() {
        assert_eq!(
            fix_requirement_diagram("requirementDiagram\nrequirement req1 { id: 1 }"),
            "requirementDiagram\nrequirement req1 {\n  id: 1\n}"
        );
        assert_eq!(fix_requirement_diagram("element e {}"), "element e {\n}");
        assert_idempotent(
            fix_requirement_diagram,
            "requirementDiagram\n    requirement req1 {\n      id: 1\n      text: \"x\"\n    }",
        );
    }

    #[test]
    fn dispatch_picks_one_rule_by_prefix() {
        assert_eq!(repair("quadrantChart\n quadrant 1: a"), "quadrantChart\n quadrant1: a");
        // a quadrant line inside a flowchart is not touched
        assert_eq!(repair("graph TD\n quadrant 1: a"), "graph TD\n quadrant 1: a");
        // dispatch looks at the literal prefix, without trimming
        assert_eq!(repair(" sankey\nA--B"), " sankey\nA--B");
        assert_eq!(repair("unknown A--B"), "unknown A--B");
    }

    #[test]
    fn dialects_without_rules_pass_through() {
        for kind in DiagramKind::ALL {
            let code = format!("{}\n    A--B\n    quadrant 1:", kind.keyword());
            let repaired = repair_kind(kind, &code);
            match kind {
                DiagramKind::Sankey | DiagramKind::QuadrantChart => assert_ne!(repaired, code),
                _ => assert_eq!(repaired, code, "{kind}"),
            }
        }
    }
}
