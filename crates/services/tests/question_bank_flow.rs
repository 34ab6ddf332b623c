use prep_core::model::{Alternative, Letter, QuestionDraft, QuestionMeta};
use prep_core::time::fixed_clock;
use services::question_bank::Direction;
use services::{AppServices, QuestionFilter, StatusFilter};
use storage::seed::{ADMIN_USER_ID, REGULAR_USER_ID, SEED_QUESTION_ID};

fn penal_draft(statement: &str) -> QuestionDraft {
    QuestionDraft {
        statement: statement.into(),
        alternatives: Letter::ALL
            .iter()
            .map(|l| Alternative::new(*l, format!("Opção {l}")))
            .collect(),
        correct_letter: Letter::D,
        meta: QuestionMeta {
            discipline: "Direito Penal".into(),
            board: "FGV".into(),
            year: 2023,
            ..QuestionMeta::default()
        },
        tags: Vec::new(),
        source_url: None,
        image_url: None,
        official_comment: None,
        suggested_seconds: None,
    }
}

#[tokio::test]
async fn answering_updates_solved_status_and_stats() {
    let services = AppServices::in_memory(fixed_clock());
    let maria = services.sign_in_as(REGULAR_USER_ID).await.unwrap().unwrap();
    let bank = services.question_bank();

    let mut session = bank
        .start_session(maria.id, QuestionFilter::all())
        .await
        .unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(session.current().unwrap().id(), SEED_QUESTION_ID);

    session.select(Letter::C).unwrap();
    let outcome = bank.submit(&mut session, maria.id).await.unwrap();
    assert!(!outcome.attempt.is_correct());
    assert_eq!(outcome.total_attempts, 1);
    assert!(!outcome.milestone_reached);

    let unsolved = QuestionFilter::all().with_status(StatusFilter::Unsolved);
    bank.refilter(&mut session, maria.id, unsolved.clone())
        .await
        .unwrap();
    assert!(session.is_empty());

    let summary = services.stats().summary_for(maria.id).await.unwrap();
    assert_eq!((summary.total, summary.correct, summary.wrong), (1, 0, 1));

    let admin_session = bank.start_session(ADMIN_USER_ID, unsolved).await.unwrap();
    assert_eq!(admin_session.len(), 1);
}

#[tokio::test]
async fn imported_questions_join_the_bank_and_filters() {
    let services = AppServices::in_memory(fixed_clock());
    let admin = services.current_user().await.unwrap();
    services
        .admin()
        .import_csv(
            &admin,
            "penal.csv",
            vec![penal_draft("Crime culposo?"), penal_draft("Legítima defesa?")],
        )
        .await
        .unwrap();

    let bank = services.question_bank();
    let filter = QuestionFilter::all()
        .with_discipline("Direito Penal")
        .with_board("FGV");
    let mut session = bank.start_session(admin.id, filter).await.unwrap();
    assert_eq!(session.len(), 2);

    session.select(Letter::D).unwrap();
    let outcome = bank.submit(&mut session, admin.id).await.unwrap();
    assert!(outcome.attempt.is_correct());
    assert!(session.advance(Direction::Next, fixed_clock().now()));
    assert!(!session.is_answered());

    let report = services.stats().report_for(admin.id).await.unwrap();
    assert_eq!(report.recent.len(), 1);
    assert_eq!(report.by_discipline.len(), 1);
    assert_eq!(report.by_discipline[0].discipline, "Direito Penal");
}
