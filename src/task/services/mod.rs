//! Application services for task mutation and the tasks request surface.

mod dto;
mod handler;
mod history;
mod mutator;

pub use dto::{
    CommentResponse, CreateCommentPayload, CreateTaskPayload, DeleteTaskPayload,
    HistoryResponse, ListTasksPayload, TaskIdPayload, TaskResponse, TasksByUserPayload,
    UpdateStatusPayload, UpdateTaskPayload,
};
pub use handler::TaskRequestHandler;
pub use history::HistoryRecorder;
pub use mutator::{CreateTaskRequest, TaskMutationError, TaskMutationResult, TaskMutator};
