use clap::Subcommand;
use focusraid_core::{Clock, Database, FocusGroupSessionCoordinator, SystemClock};

use super::host::{print_json, GROUP_KEY};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Start an exploration across the given template ids
    Start {
        /// Member template ids, first one active
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Add focused seconds to the active member
    Record {
        seconds: f64,
    },
    /// Switch the active member by index
    Switch {
        index: usize,
    },
    /// Print the exploration in progress
    Show,
    /// Close the exploration and print the allocation
    End,
}

fn load(db: &Database) -> Result<FocusGroupSessionCoordinator, Box<dyn std::error::Error>> {
    db.kv_get_json::<FocusGroupSessionCoordinator>(GROUP_KEY)?
        .ok_or_else(|| "no focus group in progress".into())
}

pub fn run(action: GroupAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = SystemClock.now();

    match action {
        GroupAction::Start { ids } => {
            let group = FocusGroupSessionCoordinator::new(ids, now)?;
            db.kv_set_json(GROUP_KEY, &group)?;
            print_json(&group)?;
        }
        GroupAction::Record { seconds } => {
            let mut group = load(&db)?;
            group.record_focused(seconds);
            db.kv_set_json(GROUP_KEY, &group)?;
            print_json(&group)?;
        }
        GroupAction::Switch { index } => {
            let mut group = load(&db)?;
            if !group.switch_to(index, now) {
                return Err(format!(
                    "index {index} out of range for {} members",
                    group.members().len()
                )
                .into());
            }
            db.kv_set_json(GROUP_KEY, &group)?;
            print_json(&group)?;
        }
        GroupAction::Show => {
            print_json(&load(&db)?)?;
        }
        GroupAction::End => {
            let summary = load(&db)?.end_exploration(now);
            db.kv_delete(GROUP_KEY)?;
            print_json(&summary)?;
        }
    }
    Ok(())
}
