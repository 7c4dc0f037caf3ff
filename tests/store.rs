//! Behaviour every `TodoStore` implementation must share.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use todos::handlers::{self, TodoForm};
use todos::store::ValidationError;
use todos::utils::{self, parse_due_date};
use todos::{Database, InMemoryStore, StoreError, TodoStore};

fn stores() -> Vec<(&'static str, Box<dyn TodoStore>)> {
    vec![
        ("sqlite", Box::new(Database::open_in_memory().unwrap())),
        ("memory", Box::new(InMemoryStore::new())),
    ]
}

#[test]
fn create_sets_defaults_and_timestamps() {
    for (name, store) in stores() {
        let before = utils::now();
        let todo = store.create("Buy milk", None, None).unwrap();

        assert_eq!(todo.title, "Buy milk", "{name}");
        assert!(!todo.resolved, "{name}");
        assert_eq!(todo.due_date, None, "{name}");
        assert_eq!(todo.description, None, "{name}");
        assert_eq!(todo.created_at, todo.updated_at, "{name}");
        assert!(todo.created_at >= before, "{name}");

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1, "{name}");
        assert_eq!(all[0], todo, "{name}");
    }
}

#[test]
fn create_rejects_empty_title() {
    for (name, store) in stores() {
        for title in ["", "   "] {
            let err = store.create(title, Some("desc"), None).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{name}");
        }
        assert!(store.list_all().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn get_missing_is_not_found() {
    for (name, store) in stores() {
        assert!(matches!(store.get(9999), Err(StoreError::NotFound(9999))), "{name}");
    }
}

#[test]
fn list_is_newest_first() {
    for (name, store) in stores() {
        let a = store.create("A", None, None).unwrap();
        let b = store.create("B", None, None).unwrap();
        let c = store.create("C", None, None).unwrap();

        let ids: Vec<i64> = store.list_all().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id], "{name}");
    }
}

#[test]
fn failed_update_changes_nothing() {
    for (name, store) in stores() {
        let todo = store.create("Original", Some("Keep me"), None).unwrap();
        let err = store.update(todo.id, "", Some("Changed"), None).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{name}");
        assert_eq!(store.get(todo.id).unwrap(), todo, "{name}");

        let err = store.update(9999, "", None, None).unwrap_err();
        assert!(err.is_not_found(), "{name}");
    }
}

#[test]
fn update_keeps_created_at_and_clears_due_date() {
    for (name, store) in stores() {
        let due = Some(utils::now() + Duration::days(3));
        let todo = store.create("Original", None, due).unwrap();

        let updated = store.update(todo.id, "Updated", Some("More"), None).unwrap();
        assert_eq!(updated.created_at, todo.created_at, "{name}");
        assert!(updated.updated_at > todo.updated_at, "{name}");
        assert_eq!(updated.due_date, None, "{name}");

        let stored = store.get(todo.id).unwrap();
        assert_eq!(stored, updated, "{name}");
    }
}

#[test]
fn delete_then_get_is_not_found() {
    for (name, store) in stores() {
        let todo = store.create("To Delete", None, None).unwrap();
        store.delete(todo.id).unwrap();
        assert!(store.get(todo.id).unwrap_err().is_not_found(), "{name}");
        assert!(store.delete(todo.id).unwrap_err().is_not_found(), "{name}");
        assert!(store.list_all().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn toggling_twice_restores_flag_and_advances_updated_at() {
    for (name, store) in stores() {
        let todo = store.create("Toggle Me", None, None).unwrap();

        let first = store.set_resolved(todo.id, !todo.resolved).unwrap();
        let second = store.set_resolved(todo.id, !first.resolved).unwrap();

        assert_eq!(second.resolved, todo.resolved, "{name}");
        assert!(first.updated_at > todo.updated_at, "{name}");
        assert!(second.updated_at > first.updated_at, "{name}");
        assert_eq!(second.created_at, todo.created_at, "{name}");
        assert_eq!(store.get(todo.id).unwrap(), second, "{name}");

        assert!(store.set_resolved(9999, true).unwrap_err().is_not_found(), "{name}");
    }
}

#[test]
fn due_date_round_trips() {
    for (name, store) in stores() {
        let due = parse_due_date("2031-07-04T09:30:15.250000+02:00");
        let todo = store.create("x", None, due).unwrap();
        assert_eq!(store.get(todo.id).unwrap().due_date, due, "{name}");

        let todo = store.create("y", None, parse_due_date("")).unwrap();
        assert_eq!(store.get(todo.id).unwrap().due_date, None, "{name}");
    }
}

#[test]
fn resolving_clears_overdue() {
    for (name, store) in stores() {
        let yesterday = utils::now() - Duration::days(1);
        let todo = store.create("Pay rent", None, Some(yesterday)).unwrap();
        assert!(todo.is_overdue(), "{name}");

        let resolved = store.set_resolved(todo.id, true).unwrap();
        assert!(!resolved.is_overdue(), "{name}");
        assert!(!store.get(todo.id).unwrap().is_overdue_at(Utc::now()), "{name}");
    }
}

#[test]
fn text_is_stored_verbatim() {
    for (name, store) in stores() {
        let title = "Todo with émojis 🎉 and spëcial ©haracters";
        let description = "x".repeat(10_000);
        let todo = store.create(title, Some(&description), None).unwrap();

        let stored = store.get(todo.id).unwrap();
        assert_eq!(stored.title, title, "{name}");
        assert_eq!(stored.description.as_deref(), Some(description.as_str()), "{name}");
    }
}

#[test]
fn far_future_due_date_from_a_form_keeps_the_list_readable() {
    let db = Database::open_in_memory().unwrap();
    let form = TodoForm {
        title: "Someday".to_string(),
        description: String::new(),
        due_date: "+10000-01-01T00:00".to_string(),
    };
    handlers::create(&db, &form).unwrap();

    let todos = db.list_all().unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].due_date, None);
}

#[test]
fn due_dates_beyond_year_9999_are_rejected() {
    for (name, store) in stores() {
        let far = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
        let err = store.create("Far", None, Some(far)).unwrap_err();
        assert!(
            matches!(err, StoreError::Validation(ValidationError::DueDateOutOfRange)),
            "{name}"
        );

        let todo = store.create("Near", None, None).unwrap();
        let err = store.update(todo.id, "Near", None, Some(far)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "{name}");
        assert_eq!(store.get(todo.id).unwrap(), todo, "{name}");
        assert_eq!(store.list_all().unwrap().len(), 1, "{name}");
    }
}

fn date_time_input() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just(""), Just("+"), Just("-")],
        0u32..100_000,
        0u32..14,
        0u32..33,
        0u32..25,
        0u32..61,
        prop_oneof![Just(""), Just("Z"), Just("+14:00"), Just("-14:00")],
    )
        .prop_map(|(sign, year, month, day, hour, minute, zone)| {
            format!("{sign}{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}{zone}")
        })
}

proptest! {
    #[test]
    fn every_parsed_due_date_reads_back(input in date_time_input()) {
        if let Some(due) = parse_due_date(&input) {
            let db = Database::open_in_memory().unwrap();
            let created = db.create("Dated", None, Some(due)).unwrap();
            let todos = db.list_all().unwrap();
            prop_assert_eq!(todos.len(), 1);
            prop_assert_eq!(todos[0].due_date, Some(due));
            prop_assert_eq!(&todos[0], &created);
        }
    }
}
