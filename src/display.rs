//! Human-readable output for the `show` and `summary` commands.

use anyhow::Result;
use std::path::Path;

use crate::store;
use crate::summary;

/// Print one persisted title record.
pub fn show_title(processed_dir: &Path, number: u32) -> Result<()> {
    let Some(title) = store::load_title(processed_dir, number)? else {
        println!("No processed data found for title {}", number);
        return Ok(());
    };

    println!();
    println!("{}", title.full_name);
    println!("{}", "=".repeat(72));
    if title.agencies.is_empty() {
        println!("  Agencies:        unknown");
    } else {
        println!("  Agencies:        {}", title.agencies.join(", "));
    }
    println!(
        "  Latest amended:  {}",
        title.dates.latest_amended_on.as_deref().unwrap_or("unknown")
    );
    println!("  Processed:       {}", title.dates.processed_date);
    println!();
    println!("  Words:           {}", format_number(title.metrics.word_count));
    println!("  Sections:        {}", format_number(title.metrics.section_count));
    println!("  Paragraphs:      {}", format_number(title.metrics.paragraph_count));
    println!("  Chapters:        {}", format_number(title.metrics.chapter_count));
    if title.metrics.readability_score != 0.0 {
        println!("  Readability:     {:.1}", title.metrics.readability_score);
    }

    if !title.chapters.is_empty() {
        println!();
        println!("  Chapters ({}):", title.chapters.len());
        for chapter in title.chapters.iter().take(5) {
            println!("    {}: {}", chapter.number, chapter.name);
        }
        if title.chapters.len() > 5 {
            println!("    ... and {} more", title.chapters.len() - 5);
        }
    }

    if !title.sections.is_empty() {
        println!();
        println!("  Sections ({}):", title.sections.len());
        for section in title.sections.iter().take(5) {
            println!(
                "    {}: {} ({} words)",
                section.number,
                section.name,
                format_number(section.word_count)
            );
        }
        if title.sections.len() > 5 {
            println!("    ... and {} more", title.sections.len() - 5);
        }
    } else {
        println!();
        println!("  (reserved title: no sections)");
    }

    Ok(())
}

/// Print the cross-title summary artifact.
pub fn show_summary(processed_dir: &Path) -> Result<()> {
    let Some(summary) = summary::load_summary(processed_dir)? else {
        println!("No summary data found. Run `ecfr process` first.");
        return Ok(());
    };

    println!();
    println!("eCFR Processing Summary");
    println!("{}", "=".repeat(72));
    println!("  Titles processed:  {}", summary.total_titles);
    println!(
        "  Total words:       {}",
        format_number(summary.total_metrics.word_count)
    );
    println!(
        "  Total sections:    {}",
        format_number(summary.total_metrics.section_count)
    );
    println!(
        "  Total paragraphs:  {}",
        format_number(summary.total_metrics.paragraph_count)
    );

    println!();
    println!("  Amended date range: {} to {}",
        summary.date_ranges.earliest_amended.as_deref().unwrap_or("unknown"),
        summary.date_ranges.latest_amended.as_deref().unwrap_or("unknown"),
    );

    if !summary.agencies.is_empty() {
        let mut counts: Vec<(&String, &u64)> = summary.agencies.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        println!();
        println!("  Top agencies by titles:");
        for (agency, count) in counts.into_iter().take(5) {
            println!("    {:>3}  {}", count, agency);
        }
    }

    let mut by_words = summary.titles.clone();
    by_words.sort_by(|a, b| b.metrics.word_count.cmp(&a.metrics.word_count));
    println!();
    println!("  Largest titles by word count:");
    for title in by_words.iter().take(10) {
        println!(
            "    Title {:>2}: {} - {} words",
            title.number,
            title.name,
            format_number(title.metrics.word_count)
        );
    }
    println!();

    Ok(())
}

/// Format a count with thousands separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len().saturating_sub(1)) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
