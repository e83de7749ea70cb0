use std::fmt::Write;
use std::path::Path;

use crate::matcher::normalize::normalize_name;
use crate::models::match_result::MatchResult;
use crate::models::scan_result::ScanResult;

pub fn export_markdown(
    result: &ScanResult,
    matches: Option<&[Vec<MatchResult>]>,
    output_path: &Path,
) -> anyhow::Result<()> {
    std::fs::write(output_path, render_markdown(result, matches)?)?;
    Ok(())
}

pub fn render_markdown(
    result: &ScanResult,
    matches: Option<&[Vec<MatchResult>]>,
) -> Result<String, std::fmt::Error> {
    let mut md = String::new();

    writeln!(md, "# Game Scan Report")?;
    writeln!(md)?;
    for path in &result.scanned_paths {
        writeln!(md, "- **Path:** {}", path.display())?;
    }
    writeln!(md, "- **State:** {:?}", result.state)?;
    writeln!(md, "- **Games Found:** {}", result.stats.games_found)?;
    writeln!(md, "- **Directories:** {}", result.stats.processed_dirs)?;
    writeln!(md, "- **Files:** {}", result.stats.processed_files)?;
    writeln!(md, "- **Skipped:** {}", result.stats.skipped_paths)?;
    writeln!(md, "- **Errors:** {}", result.stats.errors)?;
    writeln!(md, "- **Scan Duration:** {:.2}s", result.duration.as_secs_f64())?;
    writeln!(md)?;

    writeln!(md, "## Games")?;
    writeln!(md)?;
    if matches.is_some() {
        writeln!(md, "| Name | Path | Best Match | Confidence | Decision |")?;
        writeln!(md, "|------|------|------------|------------|----------|")?;
    } else {
        writeln!(md, "| Name | Path | Size |")?;
        writeln!(md, "|------|------|------|")?;
    }

    for (index, game) in result.games.iter().enumerate() {
        let name = normalize_name(game.display_name());
        match matches {
            Some(all) => {
                let best = all.get(index).and_then(|m| m.first());
                let (title, confidence, decision) = match best {
                    Some(m) => (
                        m.candidate.name.as_str(),
                        format!("{:.2}", m.confidence),
                        decision(m),
                    ),
                    None => ("-", String::from("-"), "no match"),
                };
                writeln!(
                    md,
                    "| {} | {} | {} | {} | {} |",
                    name,
                    game.path.display(),
                    title,
                    confidence,
                    decision
                )?;
            }
            None => {
                writeln!(
                    md,
                    "| {} | {} | {} |",
                    name,
                    game.path.display(),
                    game.human_readable_size()
                )?;
            }
        }
    }

    Ok(md)
}

fn decision(m: &MatchResult) -> &'static str {
    if m.is_auto_add_candidate {
        "auto-add"
    } else if m.requires_user_selection {
        "needs selection"
    } else {
        "discard"
    }
}
