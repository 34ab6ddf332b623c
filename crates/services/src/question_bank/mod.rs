mod filter;
mod session;
mod workflow;

pub use crate::error::{BankError, SessionError, StatusFilterError};
pub use filter::{QuestionFilter, StatusFilter};
pub use session::{AnswerState, Direction, QuestionSession, SessionPosition};
pub use workflow::{ANSWER_MILESTONE, QuestionBankService, SubmitOutcome};
