use crate::config::Config;
use crate::error::{ErrorCode, QuestError};
use crate::lock::LedgerLock;
use crate::model::Ledger;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Lockless readers retry a transient parse failure this many times before
/// treating the ledger as corrupt.
const READ_RETRIES: u32 = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(15);

/// Load the ledger for `root_id`.
///
/// Never fails: a missing file yields an empty ledger, and an unreadable or
/// malformed file is treated the same way after a short retry window (a
/// writer may be mid-rename). Losing a corrupt ledger beats blocking every
/// agent on it.
#[must_use]
pub fn load(cfg: &Config, root_id: &str) -> Ledger {
    let path = cfg.ledger_path(root_id);
    if !path.exists() {
        return Ledger::empty(root_id);
    }

    for attempt in 0..READ_RETRIES {
        match read_ledger(&path) {
            Ok(mut ledger) => {
                // The file is keyed by root id; whatever is embedded inside
                // follows the key, not the other way around.
                ledger.root_id = root_id.to_string();
                return ledger;
            }
            Err(err) => {
                debug!(path = %path.display(), attempt, %err, "ledger read failed");
                if attempt + 1 < READ_RETRIES {
                    thread::sleep(READ_RETRY_DELAY);
                }
            }
        }
    }

    warn!(
        code = %ErrorCode::CorruptLedger,
        path = %path.display(),
        "ledger unreadable; treating as empty"
    );
    Ledger::empty(root_id)
}

fn read_ledger(path: &Path) -> Result<Ledger, QuestError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Persist the full ledger atomically: serialize to a sibling temp file,
/// then rename over the destination. The quests directory is created on
/// demand.
pub fn save(cfg: &Config, ledger: &Ledger) -> Result<(), QuestError> {
    let path = cfg.ledger_path(&ledger.root_id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let body = serde_json::to_string_pretty(ledger)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, &path)?;
    debug!(root_id = %ledger.root_id, quests = ledger.quests.len(), "ledger saved");
    Ok(())
}

/// Run one mutation as a critical section: lock, load, apply, save.
///
/// The per-ledger lock is held across the whole read-modify-write so
/// concurrent mutations from sibling processes cannot lose each other's
/// changes. If `f` rejects the operation, nothing is persisted and the
/// on-disk ledger is untouched.
pub fn mutate<T>(
    cfg: &Config,
    root_id: &str,
    f: impl FnOnce(&mut Ledger) -> Result<T, QuestError>,
) -> Result<T, QuestError> {
    let lock = LedgerLock::acquire(&cfg.lock_path(root_id), cfg.lock_timeout)?;
    let mut ledger = load(cfg, root_id);
    let outcome = f(&mut ledger)?;
    save(cfg, &ledger)?;
    lock.release();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::{load, mutate, save};
    use crate::config::Config;
    use crate::error::QuestError;
    use crate::model::{Ledger, Quest, Status};
    use proptest::prelude::*;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    fn cfg_for(dir: &TempDir) -> Config {
        Config::with_dirs(dir.path().join("data"), dir.path().join("sessions"))
    }

    fn sample_quest(id: &str, status: Status) -> Quest {
        Quest {
            id: id.into(),
            subject: format!("subject for {id}"),
            description: "the full brief".into(),
            status,
            active_form: Some("working".into()),
            blocked_by: vec!["quest-999".into()],
            created_at: "2026-08-06T10:00:00.000Z".into(),
            updated_at: "2026-08-06T10:05:00.000Z".into(),
        }
    }

    #[test]
    fn missing_file_loads_as_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let cfg = cfg_for(&dir);
        let ledger = load(&cfg, "ses_new");
        assert_eq!(ledger.root_id, "ses_new");
        assert!(ledger.quests.is_empty());
    }

    #[test]
    fn save_load_roundtrips_exactly() {
        let dir = TempDir::new().unwrap();
        let cfg = cfg_for(&dir);
        let mut ledger = Ledger::empty("ses_root");
        ledger.quests.push(sample_quest("quest-001", Status::Completed));
        ledger.quests.push(sample_quest("quest-002", Status::Pending));

        save(&cfg, &ledger).unwrap();
        let back = load(&cfg, "ses_root");
        assert_eq!(back, ledger);
        // Order and exact timestamp strings survive.
        assert_eq!(back.quests[0].id, "quest-001");
        assert_eq!(back.quests[1].created_at, "2026-08-06T10:00:00.000Z");
        // Dangling blocker references persist untouched.
        assert_eq!(back.quests[0].blocked_by, vec!["quest-999"]);
    }

    #[test]
    fn empty_ledger_roundtrips() {
        let dir = TempDir::new().unwrap();
        let cfg = cfg_for(&dir);
        let ledger = Ledger::empty("ses_empty");
        save(&cfg, &ledger).unwrap();
        assert_eq!(load(&cfg, "ses_empty"), ledger);
    }

    #[test]
    fn corrupt_file_loads_as_empty_without_failing() {
        let dir = TempDir::new().unwrap();
        let cfg = cfg_for(&dir);
        fs::create_dir_all(cfg.quests_dir()).unwrap();
        fs::write(cfg.ledger_path("ses_bad"), "{definitely not json").unwrap();

        let ledger = load(&cfg, "ses_bad");
        assert!(ledger.quests.is_empty());
        assert_eq!(ledger.root_id, "ses_bad");
    }

    #[test]
    fn save_creates_quests_directory_on_demand() {
        let dir = TempDir::new().unwrap();
        let cfg = cfg_for(&dir);
        assert!(!cfg.quests_dir().exists());
        save(&cfg, &Ledger::empty("ses_a")).unwrap();
        assert!(cfg.ledger_path("ses_a").exists());
    }

    #[test]
    fn mutate_persists_the_applied_change() {
        let dir = TempDir::new().unwrap();
        let cfg = cfg_for(&dir);
        let mut ledger = Ledger::empty("ses_m");
        ledger.quests.push(sample_quest("quest-001", Status::Pending));
        save(&cfg, &ledger).unwrap();

        mutate(&cfg, "ses_m", |l| {
            l.find_mut("quest-001").expect("exists").subject = "renamed".into();
            Ok(())
        })
        .unwrap();

        assert_eq!(load(&cfg, "ses_m").quests[0].subject, "renamed");
    }

    #[test]
    fn rejected_mutation_leaves_ledger_unchanged() {
        let dir = TempDir::new().unwrap();
        let cfg = cfg_for(&dir);
        let mut ledger = Ledger::empty("ses_r");
        ledger.quests.push(sample_quest("quest-001", Status::Pending));
        save(&cfg, &ledger).unwrap();

        let result: Result<(), QuestError> = mutate(&cfg, "ses_r", |l| {
            l.find_mut("quest-001").expect("exists").subject = "half-applied".into();
            Err(QuestError::EmptyUpdate {
                id: "quest-001".into(),
            })
        });

        assert!(result.is_err());
        assert_eq!(load(&cfg, "ses_r").quests[0].subject, "subject for quest-001");
    }

    #[test]
    fn concurrent_mutations_both_persist() {
        let dir = TempDir::new().unwrap();
        let cfg = cfg_for(&dir);
        let mut ledger = Ledger::empty("ses_c");
        ledger.quests.push(sample_quest("quest-001", Status::Pending));
        ledger.quests.push(sample_quest("quest-002", Status::Pending));
        save(&cfg, &ledger).unwrap();

        let cfg_a = cfg.clone();
        let cfg_b = cfg.clone();
        let a = thread::spawn(move || {
            mutate(&cfg_a, "ses_c", |l| {
                l.find_mut("quest-001").expect("exists").subject = "from thread a".into();
                Ok(())
            })
        });
        let b = thread::spawn(move || {
            mutate(&cfg_b, "ses_c", |l| {
                l.find_mut("quest-002").expect("exists").description = "from thread b".into();
                Ok(())
            })
        });
        a.join().unwrap().unwrap();
        b.join().unwrap().unwrap();

        let back = load(&cfg, "ses_c");
        assert_eq!(back.find("quest-001").expect("exists").subject, "from thread a");
        assert_eq!(
            back.find("quest-002").expect("exists").description,
            "from thread b"
        );
    }

    fn arb_status() -> impl Strategy<Value = Status> {
        prop_oneof![
            Just(Status::Pending),
            Just(Status::InProgress),
            Just(Status::Completed),
        ]
    }

    fn arb_quest() -> impl Strategy<Value = Quest> {
        (
            0u64..1500,
            "\\PC{0,20}",
            "\\PC{0,40}",
            arb_status(),
            proptest::option::of("\\PC{1,16}"),
            proptest::collection::vec("quest-[0-9]{3}", 0..4),
            "[0-9TZ:.+-]{8,28}",
            "[0-9TZ:.+-]{8,28}",
        )
            .prop_map(
                |(n, subject, description, status, active_form, blocked_by, created, updated)| {
                    Quest {
                        id: Quest::format_id(n),
                        subject,
                        description,
                        status,
                        active_form,
                        blocked_by,
                        created_at: created,
                        updated_at: updated,
                    }
                },
            )
    }

    fn arb_ledger() -> impl Strategy<Value = Ledger> {
        ("[a-z0-9_]{1,12}", proptest::collection::vec(arb_quest(), 0..8)).prop_map(
            |(root_id, quests)| Ledger {
                root_id: format!("ses_{root_id}"),
                quests,
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn any_ledger_roundtrips(ledger in arb_ledger()) {
            let dir = TempDir::new().unwrap();
            let cfg = cfg_for(&dir);
            save(&cfg, &ledger).unwrap();
            prop_assert_eq!(load(&cfg, &ledger.root_id), ledger);
        }
    }
}
