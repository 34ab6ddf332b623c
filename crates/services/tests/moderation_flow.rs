use prep_core::model::{Role, RoomCategory, RoomId};
use prep_core::time::fixed_clock;
use services::{AdminError, AppServices, ModerationOutcome};
use storage::seed::{REGULAR_USER_ID, SEED_QUESTION_ID};

#[tokio::test]
async fn promoted_moderator_can_pin_and_delete_comments() {
    let services = AppServices::in_memory(fixed_clock());
    let admin = services.current_user().await.unwrap();
    let comments = services.comments();

    let maria = services
        .storage()
        .users
        .get_user(REGULAR_USER_ID)
        .await
        .unwrap()
        .unwrap();
    let first = comments
        .post(&maria, SEED_QUESTION_ID, "Art. 3º, II da CF.")
        .await
        .unwrap();
    let second = comments
        .post(&maria, SEED_QUESTION_ID, "Questão clássica da PF.")
        .await
        .unwrap();

    assert_eq!(
        comments.pin(&maria, second.id()).await.unwrap(),
        ModerationOutcome::Denied
    );

    let maria = services
        .admin()
        .change_role(&admin, maria.id, Role::Moderator)
        .await
        .unwrap();
    assert!(comments.pin(&maria, second.id()).await.unwrap().is_applied());

    let listed = comments.list(SEED_QUESTION_ID).await.unwrap();
    assert_eq!(listed[0].id(), second.id());
    assert!(listed[0].is_pinned());

    assert!(comments.delete(&maria, first.id()).await.unwrap().is_applied());
    assert_eq!(comments.list(SEED_QUESTION_ID).await.unwrap().len(), 1);

    assert!(matches!(
        services.admin().users(&maria).await,
        Err(AdminError::Forbidden)
    ));
    let logs = services.admin().logs(&admin).await.unwrap();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn chat_rooms_are_created_by_staff_and_scoped_per_room() {
    let services = AppServices::in_memory(fixed_clock());
    let admin = services.current_user().await.unwrap();
    let chat = services.chat();

    let maria = services.sign_in_as(REGULAR_USER_ID).await.unwrap().unwrap();
    assert_eq!(
        chat.create_room(&maria, "pc-sp", "Polícia Civil SP", RoomCategory::Position)
            .await
            .unwrap(),
        ModerationOutcome::Denied
    );
    assert!(
        chat.create_room(&admin, "pc-sp", "Polícia Civil SP", RoomCategory::Position)
            .await
            .unwrap()
            .is_applied()
    );

    let room = RoomId::new("pc-sp").unwrap();
    chat.send(&maria, &room, "Bem-vindos!", None).await.unwrap();

    let geral = RoomId::new("geral").unwrap();
    assert!(chat.messages(&geral).await.unwrap().is_empty());
    assert_eq!(chat.messages(&room).await.unwrap().len(), 1);
    assert_eq!(chat.search_rooms("civil").await.unwrap().len(), 1);
}
