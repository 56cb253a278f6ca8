use std::io::{self, Write};

use sigcheck_core::{MemberDeclaration, MemberKind, SourceUnit};

use crate::CheckReport;

/// Compiler-style text: one line per finding, a `note:` per further declaration and a summary.
pub fn render_text(report: &CheckReport, out: &mut impl Write) -> io::Result<()> {
    for file in &report.files {
        let path = file.path.display();
        for finding in &file.findings {
            let primary = finding.primary_location();
            writeln!(
                out,
                "{path}:{}:{}: {}[{}] {}",
                primary.line,
                primary.column,
                finding.severity,
                finding.code(),
                finding.message()
            )?;
            for member in finding.members.iter().skip(1) {
                let loc = member.location();
                writeln!(
                    out,
                    "  note: also declared {} at {path}:{}:{}",
                    member.visibility(),
                    loc.line,
                    loc.column
                )?;
            }
        }
    }

    let summary = &report.summary;
    writeln!(
        out,
        "summary: {} {} checked, {} {}, {} {}",
        summary.files_checked,
        plural(summary.files_checked, "file", "files"),
        summary.errors,
        plural(summary.errors, "error", "errors"),
        summary.warnings,
        plural(summary.warnings, "warning", "warnings"),
    )
}

/// The declaration model of one file, one type per block.
pub fn render_declarations(unit: &SourceUnit, out: &mut impl Write) -> io::Result<()> {
    for ty in &unit.types {
        match ty.location() {
            Some(loc) => writeln!(out, "{} ({}:{})", ty.name(), loc.line, loc.column)?,
            None => writeln!(out, "{}", ty.name())?,
        }
        for member in ty.members() {
            writeln!(out, "  {}", describe_member(member))?;
        }
    }
    Ok(())
}

fn describe_member(member: &MemberDeclaration) -> String {
    let loc = member.location();
    let kind = match member.kind() {
        MemberKind::Method => "method",
        MemberKind::Constructor => "constructor",
        MemberKind::Field => "field",
    };
    let mut line = format!("{}:{} {} {kind} ", loc.line, loc.column, member.visibility());
    if !member.type_params().is_empty() {
        line.push_str(&format!("<{}> ", member.type_params().join(", ")));
    }
    line.push_str(member.name());
    if member.kind().is_callable() {
        let params: Vec<String> = member.params().iter().map(ToString::to_string).collect();
        line.push_str(&format!("({})", params.join(", ")));
    }
    for decoration in member.decorations() {
        line.push_str(&format!(" {decoration}"));
    }
    line
}

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}
