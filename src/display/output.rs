use colored::*;
use counterpick::analysis::recommender::{ChampionLookup, Recommendation, RosterListing};
use counterpick::cache::StaleWarning;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct PickRow {
    rank: String,
    champion: String,
    tags: String,
    range: String,
    difficulty: String,
    score: String,
}

#[derive(Tabled)]
struct ExplainRow {
    champion: String,
    class: String,
    range: String,
    dive: String,
    difficulty: String,
    versatility: String,
    total: String,
}

#[derive(Tabled)]
struct RosterRow {
    id: String,
    name: String,
    tags: String,
}

pub fn display_recommendations(recommendation: &Recommendation, explain: bool) {
    let enemy = &recommendation.enemy;

    println!(
        "\n{}",
        format!(
            "🎯 Counter picks vs {} ({}) in {}",
            enemy.display_name,
            enemy.tag_list(),
            recommendation.role
        )
        .bold()
        .cyan()
    );
    println!("{}\n", "=".repeat(60).cyan());

    if let Some(warning) = &recommendation.stale {
        display_stale(warning);
    }

    if recommendation.is_empty() {
        println!(
            "{}",
            format!(
                "No champion in patch {} fits {} against {}",
                recommendation.version, recommendation.role, enemy.display_name
            )
            .yellow()
        );
        return;
    }

    let rows: Vec<PickRow> = recommendation
        .picks
        .iter()
        .enumerate()
        .map(|(idx, pick)| PickRow {
            rank: format!("#{}", idx + 1),
            champion: pick.champion.display_name.clone(),
            tags: pick.champion.tag_list(),
            range: format!("{:.0}", pick.champion.attack_range()),
            difficulty: format!("{}/10", pick.champion.difficulty),
            score: format!("{:.2}", pick.score),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    if explain {
        let rows: Vec<ExplainRow> = recommendation
            .picks
            .iter()
            .map(|pick| ExplainRow {
                champion: pick.champion.display_name.clone(),
                class: format!(
                    "{:+.1} ({} tag{})",
                    pick.breakdown.class,
                    pick.breakdown.class_matches,
                    if pick.breakdown.class_matches == 1 { "" } else { "s" }
                ),
                range: format!("{:+.1}", pick.breakdown.range),
                dive: format!("{:+.1}", pick.breakdown.dive),
                difficulty: format!("{:+.1}", pick.breakdown.accessibility),
                versatility: format!("{:+.1}", pick.breakdown.versatility),
                total: format!("{:.2}", pick.score),
            })
            .collect();

        println!("\n{}", "Score breakdown".bold().yellow());
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    println!("\n{}", "Interpretation".bold().yellow());
    println!("• Class: picks whose archetype beats the enemy's archetype");
    println!("• Range: ranged picks into melee enemies, divers into ranged enemies");
    println!("• Difficulty: easier champions are safer recommendations");
    println!("{}\n", format!("Patch {}", recommendation.version).dimmed());
}

pub fn display_champion(lookup: &ChampionLookup) {
    let champ = &lookup.champion;
    let stats = &champ.combat_stats;

    println!(
        "\n{}",
        format!("📖 {}, {}", champ.display_name, champ.title).bold().cyan()
    );
    println!("{}\n", "=".repeat(60).cyan());

    if let Some(warning) = &lookup.stale {
        display_stale(warning);
    }

    println!("  {} {}", "Tags:".bold(), champ.tag_list());
    println!("  {} {}/10", "Difficulty:".bold(), champ.difficulty);
    println!("  {} {:.0}", "Health:".bold(), stats.hp);
    println!("  {} {:.0}", "Move speed:".bold(), stats.move_speed);
    println!("  {} {:.0}", "Attack damage:".bold(), stats.attack_damage);
    println!("  {} {:.3}", "Attack speed:".bold(), stats.attack_speed);
    println!("  {} {:.0}", "Attack range:".bold(), stats.attack_range);
    println!("  {} {}", "Icon:".bold(), champ.icon_url);
    println!("{}\n", format!("Patch {}", lookup.version).dimmed());
}

pub fn display_roster(listing: &RosterListing) {
    println!(
        "\n{}",
        format!(
            "📋 {} champions in patch {}",
            listing.champions.len(),
            listing.version
        )
        .bold()
        .cyan()
    );
    println!("{}\n", "=".repeat(60).cyan());

    if let Some(warning) = &listing.stale {
        display_stale(warning);
    }

    let rows: Vec<RosterRow> = listing
        .champions
        .iter()
        .map(|c| RosterRow {
            id: c.id.clone(),
            name: c.name.clone(),
            tags: c
                .tags
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

fn display_stale(warning: &StaleWarning) {
    println!(
        "{} {}",
        "⚠️  Showing cached champion data:".yellow().bold(),
        format!(
            "refresh failing since {} ({})",
            warning.since.format("%Y-%m-%d %H:%M UTC"),
            warning.reason
        )
        .yellow()
    );
    println!();
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}
