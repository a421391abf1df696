//! Property-based simulation of two clients sharing one server.
//!
//! Random key presses and clock jumps for a doctor and a patient. The
//! standard invariants run on every render; the wire log is checked at the
//! end.

use std::time::Duration;

use carelink_app::{App, KeyInput, Runtime};
use carelink_client::{RosterConfig, SessionConfig, SessionContext};
use carelink_harness::{InvariantRegistry, MockServer, SimDriver, SimEnv};
use carelink_proto::{Outbound, Profile, Role, UserId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Doctor(KeyInput),
    Patient(KeyInput),
    Advance(u64),
}

fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        4 => prop_oneof![Just('a'), Just('b'), Just(' ')].prop_map(KeyInput::Char),
        2 => Just(KeyInput::Enter),
        1 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Tab),
        1 => Just(KeyInput::Down),
        1 => Just(KeyInput::Up),
        1 => Just(KeyInput::Ctrl('r')),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => key_strategy().prop_map(Step::Doctor),
        4 => key_strategy().prop_map(Step::Patient),
        1 => (100u64..40_000).prop_map(Step::Advance),
    ]
}

fn client(
    env: &SimEnv,
    server: &MockServer,
    viewer: u64,
    role: Role,
) -> Runtime<SimDriver, SimEnv> {
    let driver = SimDriver::new(server.clone(), env.clone(), UserId::from(viewer))
        .with_invariants(InvariantRegistry::standard());
    let ctx = SessionContext::new(UserId::from(viewer), role, "token").unwrap();
    let app = App::new(ctx, RosterConfig::default(), SessionConfig::default());
    Runtime::new(driver, env.clone(), app)
}

fn run(steps: Vec<Step>) -> Result<(), TestCaseError> {
    let env = SimEnv::new();
    let server = MockServer::new(env.clone());
    let users =
        [(1, "Dr. Ada", Role::Doctor), (2, "Pat", Role::Patient), (3, "Quinn", Role::Patient)];
    for (id, name, role) in users {
        server.add_user(Profile {
            id: UserId::from(id),
            full_name: name.into(),
            role: Some(role),
            specialization: None,
        });
    }

    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    rt.block_on(async {
        let mut doctor = client(&env, &server, 1, Role::Doctor);
        let mut patient = client(&env, &server, 2, Role::Patient);
        doctor.start().await.unwrap();
        patient.start().await.unwrap();

        for step in steps {
            match step {
                Step::Doctor(key) => doctor.driver_mut().press(key),
                Step::Patient(key) => patient.driver_mut().press(key),
                Step::Advance(millis) => env.advance(Duration::from_millis(millis)),
            }
            doctor.process_cycle().await.unwrap();
            patient.process_cycle().await.unwrap();
        }
    });

    for user in [1u64, 2] {
        let log = server.received_from(&UserId::from(user));
        let joins = log.iter().filter(|e| matches!(e, Outbound::JoinRoom { .. })).count();
        let leaves = log.iter().filter(|e| matches!(e, Outbound::LeaveRoom { .. })).count();
        prop_assert!(leaves <= joins);

        for event in &log {
            if let Outbound::SendMessage { content, .. } = event {
                prop_assert!(!content.trim().is_empty());
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_two_clients_hold_invariants(steps in prop::collection::vec(step_strategy(), 0..120)) {
        run(steps)?;
    }
}
