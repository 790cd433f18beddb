mod common;

use std::fs;

use common::*;
use walbatch::wal::{StepAction, WalRecord, read_records};
use walbatch::{Batch, BatchError, Operation};

#[test]
fn test_all_steps_succeed() {
    let temp = create_test_dir();
    let p = temp.path();
    let original_c = fs::read(p.join("c")).unwrap();
    let wal = p.join("wal.jsonl");

    let batch = Batch::new(
        &wal,
        vec![
            Operation::move_file(p.join("a"), p.join("b")).unwrap(),
            Operation::copy_file(p.join("c"), p.join("d")).unwrap(),
        ],
    )
    .unwrap();

    let stats = batch.execute_all().unwrap();
    assert_eq!(stats.total, 2);

    // Move: source gone, target has the original bytes
    assert!(!p.join("a").exists());
    assert_eq!(fs::read_to_string(p.join("b")).unwrap(), "contents of a\n");

    // Copy: both exist with identical bytes
    assert_eq!(fs::read(p.join("c")).unwrap(), original_c);
    assert_eq!(fs::read(p.join("d")).unwrap(), original_c);

    assert_eq!(manifest_count(&wal), 1);
    assert_eq!(
        log_statuses(&wal),
        vec![
            (StepAction::Executed, 0),
            (StepAction::Executed, 1),
            (StepAction::BatchDone, 0),
        ]
    );
}

#[test]
fn test_manifest_comes_first_and_lists_every_command() {
    let temp = create_test_dir();
    let p = temp.path();
    let wal = p.join("wal.jsonl");
    let ops = vec![
        Operation::copy_file(p.join("a"), p.join("a2")).unwrap(),
        Operation::copy_file(p.join("c"), p.join("c2")).unwrap(),
    ];

    Batch::new(&wal, ops.clone()).unwrap().execute_all().unwrap();

    let records = read_records(&wal).unwrap();
    assert_eq!(
        records[0],
        WalRecord::BatchStart {
            wal_path: wal.clone(),
            commands: ops.clone(),
        }
    );
    assert_eq!(records[1], WalRecord::executed(0, &ops[0]));
    assert_eq!(records[2], WalRecord::executed(1, &ops[1]));
    assert_eq!(records[3], WalRecord::batch_done());
}

#[test]
fn test_move_then_failing_copy_restores_source() {
    let temp = create_test_dir();
    let p = temp.path();
    fs::remove_file(p.join("c")).unwrap();
    let wal = p.join("wal.jsonl");

    let batch = Batch::new(
        &wal,
        vec![
            Operation::move_file(p.join("a"), p.join("b")).unwrap(),
            Operation::copy_file(p.join("c"), p.join("d")).unwrap(),
        ],
    )
    .unwrap();

    let err = batch.execute_all().unwrap_err();

    match &err {
        BatchError::StepFailed {
            index,
            name,
            source,
            rollback,
        } => {
            assert_eq!(*index, 1);
            assert_eq!(*name, "copy");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            assert_eq!(rollback.undone, vec![0]);
            assert!(rollback.is_clean());
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(!p.join("b").exists());
    assert_eq!(fs::read_to_string(p.join("a")).unwrap(), "contents of a\n");
    assert!(!p.join("d").exists());

    assert_eq!(
        log_statuses(&wal),
        vec![(StepAction::Executed, 0), (StepAction::Undone, 0)]
    );
}

#[test]
fn test_failure_at_k_undoes_in_reverse_order() {
    let temp = create_test_dir();
    let p = temp.path();
    let wal = p.join("wal.jsonl");
    write_file(p, "e", "contents of e");

    let batch = Batch::new(
        &wal,
        vec![
            Operation::copy_file(p.join("a"), p.join("a2")).unwrap(),
            Operation::move_file(p.join("c"), p.join("c2")).unwrap(),
            Operation::move_file(p.join("e"), p.join("e2")).unwrap(),
            Operation::copy_file(p.join("missing"), p.join("x")).unwrap(),
            Operation::copy_file(p.join("a"), p.join("never")).unwrap(),
        ],
    )
    .unwrap();

    let err = batch.execute_all().unwrap_err();
    assert!(matches!(err, BatchError::StepFailed { index: 3, .. }));
    assert_eq!(err.rollback().unwrap().undone, vec![2, 1, 0]);

    assert_eq!(
        log_statuses(&wal),
        vec![
            (StepAction::Executed, 0),
            (StepAction::Executed, 1),
            (StepAction::Executed, 2),
            (StepAction::Undone, 2),
            (StepAction::Undone, 1),
            (StepAction::Undone, 0),
        ]
    );

    // Everything is back where it started
    let mut names: Vec<_> = fs::read_dir(p)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a", "c", "e", "wal.jsonl"]);
}

#[test]
fn test_failure_on_first_step_undoes_nothing() {
    let temp = create_test_dir();
    let p = temp.path();
    let wal = p.join("wal.jsonl");

    let batch = Batch::new(
        &wal,
        vec![Operation::move_file(p.join("missing"), p.join("b")).unwrap()],
    )
    .unwrap();

    let err = batch.execute_all().unwrap_err();
    assert_eq!(err.rollback().unwrap().attempted(), 0);
    assert_eq!(manifest_count(&wal), 1);
    assert!(log_statuses(&wal).is_empty());
}

#[test]
fn test_empty_batch() {
    let temp = create_test_dir();
    let wal = temp.path().join("wal.jsonl");

    Batch::new(&wal, Vec::new()).unwrap().execute_all().unwrap();

    assert_eq!(manifest_count(&wal), 1);
    assert_eq!(log_statuses(&wal), vec![(StepAction::BatchDone, 0)]);
}

#[test]
fn test_unwritable_log_leaves_files_untouched() {
    let temp = create_test_dir();
    let p = temp.path();
    let wal = p.join("missing-dir").join("wal.jsonl");

    let batch = Batch::new(
        &wal,
        vec![Operation::move_file(p.join("a"), p.join("b")).unwrap()],
    )
    .unwrap();

    let err = batch.execute_all().unwrap_err();
    assert!(matches!(err, BatchError::Wal { .. }));
    assert!(err.rollback().is_none());

    assert_eq!(fs::read_to_string(p.join("a")).unwrap(), "contents of a\n");
    assert!(!p.join("b").exists());
    assert!(!wal.exists());
}

#[test]
fn test_log_is_appended_across_batches() {
    let temp = create_test_dir();
    let p = temp.path();
    let wal = p.join("wal.jsonl");

    Batch::new(
        &wal,
        vec![Operation::copy_file(p.join("a"), p.join("a2")).unwrap()],
    )
    .unwrap()
    .execute_all()
    .unwrap();
    Batch::new(
        &wal,
        vec![Operation::copy_file(p.join("c"), p.join("c2")).unwrap()],
    )
    .unwrap()
    .execute_all()
    .unwrap();

    assert_eq!(manifest_count(&wal), 2);
    assert_eq!(
        log_statuses(&wal),
        vec![
            (StepAction::Executed, 0),
            (StepAction::BatchDone, 0),
            (StepAction::Executed, 0),
            (StepAction::BatchDone, 0),
        ]
    );
}

#[test]
fn test_copy_overwrites_existing_target_and_undo_removes_it() {
    let temp = create_test_dir();
    let p = temp.path();
    let wal = p.join("wal.jsonl");
    write_file(p, "d", "stale data that is longer than the source");

    let batch = Batch::new(
        &wal,
        vec![
            Operation::copy_file(p.join("a"), p.join("d")).unwrap(),
            Operation::move_file(p.join("missing"), p.join("x")).unwrap(),
        ],
    )
    .unwrap();

    batch.execute_all().unwrap_err();

    // Copy undo deletes the target; prior contents are not preserved.
    assert!(!p.join("d").exists());
    assert!(p.join("a").exists());
}

#[test]
fn test_error_message_mentions_rollback() {
    let temp = create_test_dir();
    let p = temp.path();

    let batch = Batch::new(
        p.join("wal.jsonl"),
        vec![
            Operation::copy_file(p.join("a"), p.join("a2")).unwrap(),
            Operation::copy_file(p.join("missing"), p.join("x")).unwrap(),
        ],
    )
    .unwrap();

    let message = batch.execute_all().unwrap_err().to_string();
    assert!(message.contains("Step 1 (copy) failed"), "{message}");
    assert!(
        message.contains("undid 1 previously-applied step"),
        "{message}"
    );
}
