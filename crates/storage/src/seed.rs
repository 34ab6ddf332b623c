//! Default content returned for collections that have never been written.
//!
//! Seed ids are fixed so that repeated reads of an absent collection agree
//! with each other.

use prep_core::model::{
    Alternative, ChatRoom, Letter, MaterialId, PdfMaterial, Price, Question, QuestionDraft,
    QuestionId, QuestionMeta, Role, RoomCategory, RoomId, User, UserId, VideoId, VideoLesson,
};

pub const ADMIN_USER_ID: UserId = UserId::from_u128(0x0001);
pub const REGULAR_USER_ID: UserId = UserId::from_u128(0x0002);
pub const SEED_QUESTION_ID: QuestionId = QuestionId::from_u128(0x0100);
pub const SEED_VIDEO_ID: VideoId = VideoId::from_u128(0x0200);

#[must_use]
pub fn questions() -> Vec<Question> {
    let draft = QuestionDraft {
        statement: "Sobre os princípios fundamentais da República Federativa do Brasil, \
                    assinale a alternativa que apresenta um objetivo fundamental:"
            .into(),
        alternatives: vec![
            Alternative::new(Letter::A, "A soberania.").with_explanation("Fundamento."),
            Alternative::new(Letter::B, "Garantir o desenvolvimento nacional.")
                .with_explanation("Correto! Art. 3º, II."),
            Alternative::new(Letter::C, "A dignidade da pessoa humana.")
                .with_explanation("Fundamento."),
            Alternative::new(Letter::D, "O pluralismo político.").with_explanation("Fundamento."),
            Alternative::new(Letter::E, "Independência nacional.")
                .with_explanation("Princípio internacional."),
        ],
        correct_letter: Letter::B,
        meta: QuestionMeta {
            discipline: "Direito Constitucional".into(),
            subject: "Princípios Fundamentais".into(),
            subtopic: "Objetivos da República".into(),
            board: "CESPE / CEBRASPE".into(),
            agency: "Polícia Federal".into(),
            position: "Agente".into(),
            region: "Brasil".into(),
            year: 2024,
            level: "Superior".into(),
            difficulty: "Média".into(),
        },
        tags: vec!["Constituição".into(), "Direitos".into()],
        source_url: None,
        image_url: None,
        official_comment: Some("O Art. 3º da CF/88 lista os objetivos fundamentais.".into()),
        suggested_seconds: Some(180),
    };
    draft.validate(SEED_QUESTION_ID).into_iter().collect()
}

#[must_use]
pub fn rooms() -> Vec<ChatRoom> {
    [
        ("geral", "Geral (Membros)", RoomCategory::Open),
        ("pf", "Polícia Federal", RoomCategory::Position),
        ("const", "Dir. Constitucional", RoomCategory::Discipline),
    ]
    .into_iter()
    .filter_map(|(slug, name, category)| {
        RoomId::new(slug)
            .ok()
            .map(|id| ChatRoom::public_group(id, name, category))
    })
    .collect()
}

#[must_use]
pub fn users() -> Vec<User> {
    let mut joao = User::new(ADMIN_USER_ID, "João Aprovado", "joao@pa.com", Role::Admin);
    joao.online = true;
    joao.target_position = "PF".into();
    joao.city = "DF".into();
    joao.state = "DF".into();

    let mut maria = User::new(
        REGULAR_USER_ID,
        "Maria Concurseira",
        "maria@pa.com",
        Role::User,
    );
    maria.target_position = "PC".into();
    maria.city = "SP".into();
    maria.state = "SP".into();

    vec![joao, maria]
}

/// The account used when nobody has signed in yet.
#[must_use]
pub fn current_user() -> User {
    let mut user = User::new(
        ADMIN_USER_ID,
        "João Aprovado",
        "joao@concurso.com",
        Role::Admin,
    );
    user.online = true;
    user.target_position = "Agente da Polícia Federal".into();
    user.city = "Brasília".into();
    user.state = "DF".into();
    user
}

#[must_use]
pub fn videos() -> Vec<VideoLesson> {
    VideoLesson::new(
        "Direito Penal - Teoria do Crime",
        "Direito Penal",
        "https://www.w3schools.com/html/mov_bbb.mp4",
        Some("https://picsum.photos/400/225?random=1"),
    )
    .map(|v| VideoLesson {
        id: SEED_VIDEO_ID,
        ..v.with_details("Teoria do Crime", "Aula completa sobre tipicidade e ilicitude.")
    })
    .into_iter()
    .collect()
}

#[must_use]
pub fn materials() -> Vec<PdfMaterial> {
    [
        (
            0x0301,
            "E-book Polícia Civil - Questões Comentadas",
            Price::Paid { cents: 4990 },
            "E-books",
        ),
        (0x0302, "Vade Mecum Policial 2024", Price::Free, "Leis"),
    ]
    .into_iter()
    .filter_map(|(id, name, price, category)| {
        PdfMaterial::new(name, price, "#", category)
            .ok()
            .map(|m| PdfMaterial {
                id: MaterialId::from_u128(id),
                ..m
            })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_question_answers_b() {
        let qs = questions();
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].id(), SEED_QUESTION_ID);
        assert_eq!(qs[0].correct_letter(), Letter::B);
        assert_eq!(qs[0].discipline(), "Direito Constitucional");
    }

    #[test]
    fn every_seed_collection_is_populated() {
        assert_eq!(rooms().len(), 3);
        assert_eq!(users().len(), 2);
        assert_eq!(videos().len(), 1);
        assert_eq!(materials().len(), 2);
        assert_eq!(current_user().role, Role::Admin);
    }

    #[test]
    fn seeds_are_stable_across_calls() {
        assert_eq!(videos(), videos());
        assert_eq!(materials(), materials());
        assert_eq!(materials()[0].price.to_string(), "R$ 49.90");
    }
}
