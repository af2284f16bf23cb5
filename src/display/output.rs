use crate::analysis::global::ChampionGlobalSummary;
use crate::api::client::StaticData;
use crate::store::{ChampionRecord, RecordStatus};
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct RoleRow {
    role: String,
    games: String,
    wins: String,
    win_rate: String,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    slot: String,
    item: String,
}

fn item_label(item_id: i64, static_data: Option<&StaticData>) -> String {
    match static_data.and_then(|data| data.item_name(item_id)) {
        Some(name) => format!("{} ({})", name, item_id),
        None => item_id.to_string(),
    }
}

pub fn display_summary(summary: &ChampionGlobalSummary, static_data: Option<&StaticData>) {
    let title = match static_data.and_then(|data| data.champion_title()) {
        Some(title) => format!("{}, {}", summary.champion_name, title),
        None => summary.champion_name.clone(),
    };
    println!(
        "\n{}",
        format!("📊 {} on patch {}", title, summary.patch)
            .bold()
            .cyan()
    );
    println!("{}\n", "=".repeat(60).cyan());

    println!(
        "{} {} games, {} wins ({:.1}% WR, {:.1}% pick rate)",
        "📈 Overall:".bold(),
        summary.games_played.to_string().green(),
        summary.wins.to_string().green(),
        summary.win_rate,
        summary.pick_rate
    );
    println!(
        "{} {} seed accounts\n",
        "👥 Sampled:".bold(),
        summary.processed_account_ids.len()
    );

    if summary.games_played == 0 {
        println!("{}", "No games found for this champion on the current patch".yellow());
        return;
    }

    let roles: Vec<RoleRow> = summary
        .roles
        .iter()
        .map(|role| RoleRow {
            role: role.role.clone(),
            games: role.games_played.to_string(),
            wins: role.wins.to_string(),
            win_rate: format!("{:.1}%", role.win_rate),
        })
        .collect();
    let mut table = Table::new(roles);
    table.with(Style::rounded());
    println!("{}", "Roles".bold().yellow());
    println!("{}\n", table);

    if let Some(build) = &summary.best_build {
        let mut rows: Vec<ItemRow> = build
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, id)| **id != 0)
            .map(|(slot, id)| ItemRow {
                slot: (slot + 1).to_string(),
                item: item_label(*id, static_data),
            })
            .collect();
        if build.item6 != 0 {
            rows.push(ItemRow {
                slot: "trinket".to_string(),
                item: item_label(build.item6, static_data),
            });
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", "Best Build".bold().yellow());
        println!("{}\n", table);
    }

    if let Some(spells) = &summary.best_spells {
        println!(
            "{} {} + {}",
            "Summoner Spells:".bold(),
            spells.summoner1_id,
            spells.summoner2_id
        );
    }

    if !summary.best_skill_order.is_empty() {
        let order: Vec<&str> = summary
            .best_skill_order
            .iter()
            .map(|slot| match slot {
                1 => "Q",
                2 => "W",
                3 => "E",
                4 => "R",
                _ => "?",
            })
            .collect();
        println!("{} {}", "Skill Order:".bold(), order.join(" > "));
    }

    println!();
}

pub fn display_record(champion_name: &str, record: &ChampionRecord) {
    let updated = record.updated_at.format("%Y-%m-%d %H:%M UTC");
    match (record.status, &record.summary) {
        (RecordStatus::Ready, Some(summary)) => {
            display_info(&format!("Stored result for {} (updated {})", champion_name, updated));
            display_summary(summary, None);
        }
        _ => {
            let message = record.message.as_deref().unwrap_or("unknown error");
            display_error(&format!(
                "Last run for {} failed at {}: {}",
                champion_name, updated, message
            ));
        }
    }
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
