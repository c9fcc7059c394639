//! Integration tests for the mission and reward ledgers

mod common;

use std::thread;

use common::create_test_campus;
use greencampus::ledger::LedgerError;
use greencampus::qr::QrPayload;

#[test]
fn test_completion_credits_points_once() {
    let env = create_test_campus();
    let student = env.student("sari@campus.test");
    env.award(&student, 40);

    let (mission, payload) = env.mission("Sort the Recycling", 10);
    let completed = env
        .campus
        .missions()
        .complete_mission(&student, &payload)
        .unwrap();

    assert_eq!(completed.mission_id, mission.id);
    assert_eq!(completed.points_awarded, 10);
    assert_eq!(completed.total_points, 50);
    assert_eq!(completed.completed_missions, 2);

    let profile = env.campus.accounts().profile(&student).unwrap();
    assert_eq!(profile.points, 50);
    assert_eq!(profile.level(), 2);

    let again = env.campus.missions().complete_mission(&student, &payload);
    assert!(matches!(again, Err(LedgerError::AlreadyCompleted)));
    assert_eq!(env.points_of(&student), 50);

    let history = env.campus.dashboard().history(&student).unwrap();
    assert_eq!(
        history
            .completed_mission_ids
            .iter()
            .filter(|id| **id == mission.id)
            .count(),
        1
    );
}

#[test]
fn test_unknown_and_inactive_payloads_change_nothing() {
    let env = create_test_campus();
    let student = env.student("budi@campus.test");
    let (mission, payload) = env.mission("Plant a Tree", 30);

    let unknown = env
        .campus
        .missions()
        .complete_mission(&student, "NOT_A_MISSION");
    assert!(matches!(unknown, Err(LedgerError::InvalidOrInactiveMission)));

    env.campus
        .catalog()
        .set_mission_active(&env.admin, &mission.id, false)
        .unwrap();
    let inactive = env.campus.missions().complete_mission(&student, &payload);
    assert!(matches!(inactive, Err(LedgerError::InvalidOrInactiveMission)));

    let profile = env.campus.accounts().profile(&student).unwrap();
    assert_eq!(profile.points, 0);
    assert_eq!(profile.completed_missions, 0);
    assert!(
        env.campus
            .dashboard()
            .history(&student)
            .unwrap()
            .completed_mission_ids
            .is_empty()
    );
}

#[test]
fn test_tampered_signature_is_rejected() {
    let env = create_test_campus();
    let student = env.student("dewi@campus.test");
    let (mission, payload) = env.mission("Refill Station", 15);

    let bare = env
        .campus
        .missions()
        .complete_mission(&student, &mission.qr_code);
    assert!(matches!(bare, Err(LedgerError::InvalidOrInactiveMission)));

    let parsed = QrPayload::parse(&payload).unwrap();
    assert_eq!(parsed.code, mission.qr_code);
    let forged = format!("{}.{}", mission.qr_code, "0".repeat(64));
    let result = env.campus.missions().complete_mission(&student, &forged);
    assert!(matches!(result, Err(LedgerError::InvalidOrInactiveMission)));

    assert_eq!(env.points_of(&student), 0);
}

#[test]
fn test_redemption_debits_points_and_stock() {
    let env = create_test_campus();
    let student = env.student("rina@campus.test");
    env.award(&student, 100);
    let reward = env.reward("Tumbler", 60, 1);

    let redeemed = env
        .campus
        .rewards()
        .redeem_reward(&student, &reward.id)
        .unwrap();
    assert_eq!(redeemed.points_spent, 60);
    assert_eq!(redeemed.remaining_points, 40);
    assert_eq!(redeemed.remaining_stock, 0);

    let other = env.student("andi@campus.test");
    env.award(&other, 100);
    let sold_out = env.campus.rewards().redeem_reward(&other, &reward.id);
    assert!(matches!(sold_out, Err(LedgerError::OutOfStock)));
    assert_eq!(env.points_of(&other), 100);

    let history = env.campus.dashboard().history(&student).unwrap();
    assert_eq!(history.redemptions.len(), 1);
    assert_eq!(history.redemptions[0].reward_id, reward.id);
}

#[test]
fn test_insufficient_points_changes_nothing() {
    let env = create_test_campus();
    let student = env.student("yoga@campus.test");
    env.award(&student, 90);
    let reward = env.reward("Canteen Voucher", 100, 3);

    let result = env.campus.rewards().redeem_reward(&student, &reward.id);
    match result {
        Err(LedgerError::InsufficientPoints {
            required,
            available,
        }) => {
            assert_eq!(required, 100);
            assert_eq!(available, 90);
        }
        other => panic!("expected InsufficientPoints, got {:?}", other),
    }

    assert_eq!(env.points_of(&student), 90);
    let stock = env
        .campus
        .catalog()
        .get_reward(&env.admin, &reward.id)
        .unwrap()
        .stock;
    assert_eq!(stock, 3);
}

#[test]
fn test_stock_is_never_oversold() {
    let env = create_test_campus();
    let reward = env.reward("Bamboo Straw", 20, 3);
    let students: Vec<_> = (0..5)
        .map(|i| {
            let s = env.student(&format!("student{}@campus.test", i));
            env.award(&s, 50);
            s
        })
        .collect();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = students
            .iter()
            .map(|s| {
                let campus = env.reopen();
                let reward_id = reward.id.clone();
                scope.spawn(move || campus.rewards().redeem_reward(s, &reward_id))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let sold_out = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::OutOfStock)))
        .count();
    assert_eq!(succeeded, 3);
    assert_eq!(sold_out, 2);

    let stock = env
        .campus
        .catalog()
        .get_reward(&env.admin, &reward.id)
        .unwrap()
        .stock;
    assert_eq!(stock, 0);

    let total: u32 = students.iter().map(|s| env.points_of(s)).sum();
    assert_eq!(total, 5 * 50 - 3 * 20);
}

#[test]
fn test_concurrent_last_item_has_one_winner() {
    let env = create_test_campus();
    let reward = env.reward("Eco Tote Bag", 50, 1);
    let first = env.student("first@campus.test");
    let second = env.student("second@campus.test");
    env.award(&first, 50);
    env.award(&second, 50);

    let campus_a = env.reopen();
    let campus_b = env.reopen();
    let (a, b) = thread::scope(|scope| {
        let ha = scope.spawn(|| campus_a.rewards().redeem_reward(&first, &reward.id));
        let hb = scope.spawn(|| campus_b.rewards().redeem_reward(&second, &reward.id));
        (ha.join().unwrap(), hb.join().unwrap())
    });

    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        matches!(a, Err(LedgerError::OutOfStock)) || matches!(b, Err(LedgerError::OutOfStock))
    );
    assert_eq!(env.points_of(&first) + env.points_of(&second), 50);
}

#[test]
fn test_concurrent_scans_complete_once() {
    let env = create_test_campus();
    let student = env.student("twice@campus.test");
    let (_, payload) = env.mission("Turn Off the Lights", 25);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let campus = env.reopen();
                let student = &student;
                let payload = &payload;
                scope.spawn(move || campus.missions().complete_mission(student, payload))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(LedgerError::AlreadyCompleted)))
    );
    let profile = env.campus.accounts().profile(&student).unwrap();
    assert_eq!(profile.points, 25);
    assert_eq!(profile.completed_missions, 1);
}

#[test]
fn test_audit_detects_and_repairs_drift() {
    let env = create_test_campus();
    let student = env.student("drift@campus.test");
    env.award(&student, 70);
    let reward = env.reward("Seed Pack", 30, 5);
    env.campus
        .rewards()
        .redeem_reward(&student, &reward.id)
        .unwrap();

    assert!(env.campus.audit().discrepancies().unwrap().is_empty());

    env.campus
        .db()
        .conn()
        .execute(
            "UPDATE profiles SET points = 999, completed_missions = 7 WHERE id = ?1",
            [student.user_id.as_str()],
        )
        .unwrap();

    let drift = env.campus.audit().reconcile(&student.user_id).unwrap();
    assert!(!drift.is_consistent());
    assert_eq!(drift.ledger_points, 40);
    assert_eq!(drift.ledger_completions, 1);

    let denied = env.campus.audit().repair(&student);
    assert!(matches!(denied, Err(LedgerError::Forbidden)));

    let repaired = env.campus.audit().repair(&env.admin).unwrap();
    assert_eq!(repaired.len(), 1);

    let profile = env.campus.accounts().profile(&student).unwrap();
    assert_eq!(profile.points, 40);
    assert_eq!(profile.completed_missions, 1);
    assert!(env.campus.audit().discrepancies().unwrap().is_empty());
}

#[test]
fn test_repair_racing_a_completion_keeps_the_credit() {
    let env = create_test_campus();
    let student = env.student("racer@campus.test");
    let scanner = env.reopen();

    for round in 0..40 {
        env.campus
            .db()
            .conn()
            .execute(
                "UPDATE profiles SET points = 999 WHERE id = ?1",
                [student.user_id.as_str()],
            )
            .unwrap();
        let (_, payload) = env.mission(&format!("Round {round}"), 25);

        thread::scope(|scope| {
            let repair = scope.spawn(|| env.campus.audit().repair(&env.admin));
            let scan = scope.spawn(|| scanner.missions().complete_mission(&student, &payload));
            repair.join().unwrap().unwrap();
            scan.join().unwrap().unwrap();
        });

        // Whichever ran first, the result must agree with the ledger
        let after = env.campus.audit().repair(&env.admin).unwrap();
        assert!(after.is_empty(), "round {round} left drift: {after:?}");
    }
    assert_eq!(env.points_of(&student), 40 * 25);
}
