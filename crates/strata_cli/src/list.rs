//! `strata list` — print the declared sessions in build order.

use crate::{GlobalArgs, ListArgs};

/// Runs the `strata list` command.
///
/// Prints one line per session in stable topological order: name, parent
/// (if any), and group tags.
pub fn run(args: &ListArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let graph = crate::build::load_graph(&args.dirs)?;
    for (name, session) in graph.topological_order() {
        println!("{}", describe(name, session, global.verbose));
    }
    Ok(0)
}

fn describe(name: &str, session: &strata_graph::Session, verbose: bool) -> String {
    let mut line = name.to_string();
    if let Some(parent) = &session.parent {
        line.push_str(&format!("  (parent: {parent})"));
    }
    if !session.groups.is_empty() {
        line.push_str(&format!("  [{}]", session.groups.join(", ")));
    }
    if verbose && !session.description.is_empty() {
        line.push_str(&format!("  # {}", session.description));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::load_declarations_from_str;
    use strata_graph::Session;

    fn session(toml: &str) -> Session {
        let tmp = tempfile::tempdir().unwrap();
        Session::from_decl(&load_declarations_from_str(toml, tmp.path()).unwrap().remove(0))
    }

    #[test]
    fn describe_bare_session() {
        let s = session("[[session]]\nname = \"base\"\n");
        assert_eq!(describe("base", &s, false), "base");
    }

    #[test]
    fn describe_with_parent_and_groups() {
        let s = session(
            "[[session]]\nname = \"lib\"\nparent = \"base\"\ngroups = [\"core\", \"all\"]\n\n[[session]]\nname = \"base\"\n",
        );
        assert_eq!(describe("lib", &s, false), "lib  (parent: base)  [core, all]");
    }

    #[test]
    fn describe_verbose_appends_description() {
        let s = session(
            "[[session]]\nname = \"lib\"\ndescription = \"shared library layer\"\n",
        );
        assert!(describe("lib", &s, true).contains("shared library layer"));
        assert!(!describe("lib", &s, false).contains("shared"));
    }
}
