use super::*;
use crate::error::ApiErrorStatus;

// =========================================================
// 辅助函数
// =========================================================

fn metadata(captcha_required: Option<bool>) -> LinkMetadata {
    LinkMetadata {
        title: Some("Demo".into()),
        short_code: Some("abc".into()),
        captcha_required,
    }
}

fn loaded() -> UnlockSession {
    let mut session = UnlockSession::new("abc");
    session.link_loaded(metadata(None), true);
    session
}

fn at_final_step() -> UnlockSession {
    let mut session = loaded();
    for _ in 0..2 {
        session.acknowledge_ad();
        session.advance_step().unwrap();
    }
    session
}

fn counted_down() -> UnlockSession {
    let mut session = at_final_step();
    session.acknowledge_ad();
    for _ in 0..COUNTDOWN_SECONDS {
        session.tick();
    }
    session
}

// =========================================================
// 加载
// =========================================================

#[test]
fn test_starts_loading() {
    let session = UnlockSession::new("abc");
    assert_eq!(session.phase(), GatePhase::Loading);
    assert_eq!(session.short_code(), "abc");
    assert_eq!(session.countdown(), COUNTDOWN_SECONDS);
}

#[test]
fn test_load_success_enters_step_one() {
    let session = loaded();
    assert_eq!(session.phase(), GatePhase::Step(Step::One));
    assert!(!session.ad_acknowledged());
    assert_eq!(session.link().and_then(|l| l.title.as_deref()), Some("Demo"));
}

#[test]
fn test_load_failure_is_terminal() {
    let mut session = UnlockSession::new("missing");
    session.link_failed(&ApiError::new(ApiErrorStatus::NotFound, "Link not found"));

    assert_eq!(session.phase(), GatePhase::Error("Link not found".into()));
    assert_eq!(session.acknowledge_ad(), Acknowledgement::Ignored);
    assert_eq!(session.advance_step(), Err(GateRejection::NotReady));

    // 之后的加载结果不会覆盖错误
    session.link_loaded(metadata(None), true);
    assert_eq!(session.phase(), GatePhase::Error("Link not found".into()));
}

#[test]
fn test_actions_rejected_while_loading() {
    let mut session = UnlockSession::new("abc");
    assert_eq!(session.acknowledge_ad(), Acknowledgement::Ignored);
    assert_eq!(session.tick(), Tick::Ignored);
    assert_eq!(session.begin_unlock(), Err(GateRejection::NotReady));
}

// =========================================================
// 步骤推进
// =========================================================

#[test]
fn test_continue_requires_ad_acknowledgement() {
    let mut session = loaded();
    assert_eq!(session.advance_step(), Err(GateRejection::AdNotAcknowledged));
    assert_eq!(session.current_step(), Step::One);

    assert_eq!(session.acknowledge_ad(), Acknowledgement::Acknowledged);
    assert_eq!(session.advance_step(), Ok(Step::Two));
    // 新的一步需要重新确认
    assert!(!session.ad_acknowledged());
    assert_eq!(session.advance_step(), Err(GateRejection::AdNotAcknowledged));
}

#[test]
fn test_duplicate_acknowledgement_is_noop() {
    let mut session = loaded();
    assert_eq!(session.acknowledge_ad(), Acknowledgement::Acknowledged);
    let before = session.clone();
    assert_eq!(session.acknowledge_ad(), Acknowledgement::Ignored);
    assert_eq!(session, before);
}

#[test]
fn test_no_continue_on_final_step() {
    let mut session = at_final_step();
    session.acknowledge_ad();
    assert_eq!(session.advance_step(), Err(GateRejection::FinalStep));
    assert_eq!(session.current_step(), Step::Three);
}

#[test]
fn test_step_numbers() {
    assert_eq!(Step::One.number(), 1);
    assert_eq!(Step::Three.number(), Step::COUNT);
    assert!(Step::One < Step::Two);
}

// =========================================================
// 倒计时
// =========================================================

#[test]
fn test_final_ad_starts_countdown_once() {
    let mut session = at_final_step();
    assert_eq!(
        session.phase(),
        GatePhase::Final(FinalStepPhase::AwaitingAd)
    );
    assert_eq!(session.tick(), Tick::Ignored);

    assert_eq!(session.acknowledge_ad(), Acknowledgement::CountdownStarted);
    assert_eq!(session.phase(), GatePhase::Final(FinalStepPhase::Counting));
    assert_eq!(session.acknowledge_ad(), Acknowledgement::Ignored);
}

#[test]
fn test_countdown_is_monotonic_and_stops_at_zero() {
    let mut session = at_final_step();
    session.acknowledge_ad();

    let mut last = session.countdown();
    for _ in 1..COUNTDOWN_SECONDS {
        match session.tick() {
            Tick::Remaining(left) => {
                assert_eq!(left, last - 1);
                last = left;
            }
            other => panic!("unexpected tick {:?}", other),
        }
        assert!(session.begin_unlock().is_err());
    }
    assert_eq!(session.tick(), Tick::Elapsed);
    assert_eq!(session.countdown(), 0);
    assert!(session.countdown_elapsed());

    // 之后的 tick 不再有效果
    assert_eq!(session.tick(), Tick::Ignored);
    assert_eq!(session.countdown(), 0);
}

#[test]
fn test_challenge_visible_only_after_countdown() {
    let mut session = at_final_step();
    session.acknowledge_ad();
    assert!(!session.challenge_visible());

    let session = counted_down();
    assert!(session.challenge_visible());
    assert_eq!(
        session.phase(),
        GatePhase::Final(FinalStepPhase::AwaitingVerification)
    );
}

// =========================================================
// 验证与解锁
// =========================================================

#[test]
fn test_unlock_requires_verification_token() {
    let mut session = counted_down();
    assert_eq!(session.check_unlock(), Err(GateRejection::VerificationMissing));

    session.submit_verification("   ");
    assert_eq!(session.begin_unlock(), Err(GateRejection::VerificationMissing));

    session.submit_verification("tok");
    assert_eq!(session.begin_unlock(), Ok(Some("tok".into())));
    assert_eq!(session.phase(), GatePhase::Final(FinalStepPhase::Unlocking));
}

#[test]
fn test_unlock_rejected_before_countdown_ends() {
    let mut session = at_final_step();
    session.acknowledge_ad();
    session.submit_verification("tok");
    assert_eq!(session.begin_unlock(), Err(GateRejection::CountdownPending));
}

#[test]
fn test_unlock_in_flight_blocks_second_attempt() {
    let mut session = counted_down();
    session.submit_verification("tok");
    session.begin_unlock().unwrap();
    assert_eq!(session.begin_unlock(), Err(GateRejection::UnlockInFlight));
}

#[test]
fn test_unlock_success_is_terminal() {
    let mut session = counted_down();
    session.submit_verification("tok");
    session.begin_unlock().unwrap();

    let outcome = session.finish_unlock(Ok("https://dest.example".into()));

    assert_eq!(outcome, UnlockOutcome::Unlocked("https://dest.example".into()));
    assert_eq!(session.phase(), GatePhase::Unlocked);
    assert_eq!(session.destination_url(), Some("https://dest.example"));
    assert_eq!(session.begin_unlock(), Err(GateRejection::AlreadyUnlocked));
    assert_eq!(session.acknowledge_ad(), Acknowledgement::Ignored);
}

#[test]
fn test_unlock_failure_resets_verification() {
    let mut session = counted_down();
    session.submit_verification("tok");
    session.begin_unlock().unwrap();

    let outcome = session.finish_unlock(Err(ApiError::new(
        ApiErrorStatus::Forbidden,
        "Captcha verification failed",
    )));

    assert_eq!(
        outcome,
        UnlockOutcome::Rejected("Captcha verification failed".into())
    );
    assert_eq!(session.current_step(), Step::Three);
    assert!(session.countdown_elapsed());
    assert!(session.verification_token().is_none());
    assert_eq!(session.verification_generation(), 1);
    assert_eq!(session.unlock_error(), Some("Captcha verification failed"));

    // 新 token 清除错误，可以再次尝试
    session.submit_verification("tok-2");
    assert!(session.unlock_error().is_none());
    assert_eq!(session.begin_unlock(), Ok(Some("tok-2".into())));
}

#[test]
fn test_empty_destination_counts_as_failure() {
    let mut session = counted_down();
    session.submit_verification("tok");
    session.begin_unlock().unwrap();

    let outcome = session.finish_unlock(Ok(String::new()));

    assert!(matches!(outcome, UnlockOutcome::Rejected(_)));
    assert!(session.destination_url().is_none());
}

#[test]
fn test_result_without_pending_unlock_is_ignored() {
    let mut session = counted_down();
    assert_eq!(
        session.finish_unlock(Ok("https://x".into())),
        UnlockOutcome::Ignored
    );
    assert!(session.destination_url().is_none());
}

#[test]
fn test_expired_token_is_cleared() {
    let mut session = counted_down();
    session.submit_verification("tok");
    session.expire_verification();
    assert_eq!(session.check_unlock(), Err(GateRejection::VerificationMissing));
}

#[test]
fn test_verification_not_required() {
    // 未配置站点 key
    let mut session = UnlockSession::new("abc");
    session.link_loaded(metadata(None), false);
    assert!(!session.verification_required());

    // 后端声明不需要验证
    let mut session = UnlockSession::new("abc");
    session.link_loaded(metadata(Some(false)), true);
    assert!(!session.verification_required());

    for _ in 0..2 {
        session.acknowledge_ad();
        session.advance_step().unwrap();
    }
    session.acknowledge_ad();
    for _ in 0..COUNTDOWN_SECONDS {
        session.tick();
    }
    assert!(!session.challenge_visible());
    assert_eq!(session.begin_unlock(), Ok(None));
}
