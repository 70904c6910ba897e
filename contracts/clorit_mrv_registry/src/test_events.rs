extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Env, IntoVal, String, TryIntoVal,
};

use crate::events::{AuditRecordCreated, MrvRecordCreated, MrvVerified};
use crate::{AuditResult, CloritMrvRegistry, CloritMrvRegistryClient, Role};

fn setup_with_init() -> (Env, CloritMrvRegistryClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();
    let contract_id = env.register(CloritMrvRegistry, ());
    let client = CloritMrvRegistryClient::new(&env, &contract_id);
    let admin = Address::generate(&env);
    client.init(&admin);
    (env, client, admin)
}

fn s(env: &Env, value: &str) -> String {
    String::from_str(env, value)
}

fn create_record(env: &Env, client: &CloritMrvRegistryClient, provider: &Address, project_id: u64) -> u64 {
    client.create_mrv_record(
        provider,
        &project_id,
        &s(env, "monitoring"),
        &s(env, "Qm123"),
        &s(env, "Blue_Carbon_Standard"),
        &1_000,
        &s(env, "Qmsat"),
        &s(env, "Qmsens"),
    )
}

#[test]
fn test_mrv_record_created_event() {
    let (env, client, admin) = setup_with_init();
    let provider = Address::generate(&env);
    client.grant_data_provider_role(&admin, &provider);

    let record_id = create_record(&env, &client, &provider, 11);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("mrv_new"), project_id)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("mrv_new").into_val(&env),
        11u64.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: MrvRecordCreated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        MrvRecordCreated {
            record_id,
            project_id: 11,
            creator: provider,
            co2_measured: 1_000,
        }
    );
}

#[test]
fn test_audit_record_created_event() {
    let (env, client, admin) = setup_with_init();
    let auditor = Address::generate(&env);
    client.grant_auditor_role(&admin, &auditor);

    let audit_id = client.create_audit_record(
        &auditor,
        &5,
        &s(&env, "external"),
        &s(&env, "Qmfindings"),
        &s(&env, "Qmevidence"),
        &2,
        &s(&env, "Qmrecs"),
    );

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("audit_new").into_val(&env),
        5u64.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: AuditRecordCreated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        AuditRecordCreated {
            audit_id,
            project_id: 5,
            auditor,
            result: AuditResult::Unsatisfactory,
        }
    );
}

#[test]
fn test_mrv_verified_event_carries_project() {
    let (env, client, admin) = setup_with_init();
    let provider = Address::generate(&env);
    let verifier = Address::generate(&env);
    client.grant_data_provider_role(&admin, &provider);
    client.grant_verifier_role(&admin, &verifier);
    let record_id = create_record(&env, &client, &provider, 3);

    let verification_id = client.verify_mrv_record(
        &verifier,
        &record_id,
        &true,
        &s(&env, "Qmcomment"),
        &s(&env, "Qmcriteria"),
        &90,
        &s(&env, "Qmai"),
    );

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("verified"), project_id), not the record ID.
    let expected_topics = vec![
        &env,
        symbol_short!("verified").into_val(&env),
        3u64.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: MrvVerified = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        MrvVerified {
            verification_id,
            mrv_record_id: record_id,
            project_id: 3,
            verifier,
            approved: true,
            confidence_score: 90,
        }
    );
}

#[test]
fn test_role_set_event() {
    let (env, client, admin) = setup_with_init();
    let target = Address::generate(&env);

    client.grant_role(&admin, &target, &Role::Auditor);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    let expected_topics = vec![
        &env,
        symbol_short!("role_set").into_val(&env),
        target.into_val(&env),
        Role::Auditor.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let by: Address = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(by, admin);
}

#[test]
fn test_role_del_event() {
    let (env, client, admin) = setup_with_init();
    let target = Address::generate(&env);
    client.grant_role(&admin, &target, &Role::Verifier);

    client.revoke_role(&admin, &target, &Role::Verifier);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    let expected_topics = vec![
        &env,
        symbol_short!("role_del").into_val(&env),
        target.into_val(&env),
        Role::Verifier.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);
}

#[test]
fn test_paused_event() {
    let (env, client, admin) = setup_with_init();

    client.pause(&admin);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    let expected_topics = vec![&env, symbol_short!("paused").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let by: Address = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(by, admin);
}

#[test]
fn test_regrant_emits_no_event() {
    let (env, client, admin) = setup_with_init();
    let target = Address::generate(&env);
    client.grant_role(&admin, &target, &Role::Verifier);

    // A read settles the event log without adding to it.
    assert!(client.has_role(&target, &Role::Verifier));
    let before = env.events().all().len();

    client.grant_role(&admin, &target, &Role::Verifier);
    assert_eq!(env.events().all().len(), before);
    assert!(client.has_role(&target, &Role::Verifier));
}

#[test]
fn test_revoking_unheld_role_emits_no_event() {
    let (env, client, admin) = setup_with_init();
    let target = Address::generate(&env);
    client.grant_role(&admin, &target, &Role::Auditor);

    assert!(!client.has_role(&target, &Role::Verifier));
    let before = env.events().all().len();

    client.revoke_role(&admin, &target, &Role::Verifier);
    assert_eq!(env.events().all().len(), before);
    assert!(client.has_role(&target, &Role::Auditor));
}
