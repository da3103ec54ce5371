use console::{measure_text_width, style};
use std::iter;
use std::path::Path;

/// Prints a boxed summary of the rewrite that `apply` is about to perform.
///
/// The box is sized to the widest **visible** line, using
/// [`console::measure_text_width`] so ANSI color codes inside the content do
/// not throw off the padding. Borders are styled separately from the text.
///
/// # Parameters
///
/// * `branch` – The branch that will be replaced.
/// * `commits` – How many commits the record will replay.
/// * `record_path` – Where the record was read from.
///
/// # Examples
///
/// ```no_run
/// use git_history_rewrite::banner::print_banner;
/// use std::path::Path;
///
/// print_banner("main", 12, Path::new("commit_record.json"));
/// ```
pub fn print_banner(branch: &str, commits: usize, record_path: &Path) {
    let lines = banner_lines(branch, commits, record_path);

    let max_width = lines
        .iter()
        .map(|l| measure_text_width(l))
        .max()
        .unwrap_or(0)
        + 2;

    let border = "═".repeat(max_width);
    let top = style(format!("╔{}╗", border)).blue().bold();
    let bottom = style(format!("╚{}╝", border)).blue().bold();
    let left = style("║ ").blue().bold().to_string();
    let right = style("║").blue().bold().to_string();

    println!();
    println!("{top}");
    for line in lines {
        let visible = measure_text_width(&line);
        let pad = max_width - visible;
        println!("{}{}{}{}", left, line, " ".repeat(pad - 1), right);
    }
    println!("{bottom}");
    println!();
}

/// Lines of the apply banner; the warning lines carry ANSI styling.
fn banner_lines(branch: &str, commits: usize, record_path: &Path) -> Vec<String> {
    let top = ["Rewrite branch history from a commit record", ""]
        .into_iter()
        .map(|s| s.to_string());

    let summary = [
        format!("Record:  {}", record_path.display()),
        format!("Branch:  {}", branch),
        format!("Commits: {}", commits),
        String::new(),
    ]
    .into_iter();

    let steps = [
        "This tool will:",
        "  1) Build a new orphan branch, one commit per record entry",
        "  2) Delete the original branch and give the new one its name",
    ]
    .into_iter()
    .map(|s| s.to_string());

    let warning = iter::once(String::new()).chain(
        [
            style("The old history is not kept. Nothing is rolled back on failure.")
                .yellow()
                .bold()
                .to_string(),
        ]
        .into_iter(),
    );

    top.chain(summary).chain(steps).chain(warning).collect()
}
