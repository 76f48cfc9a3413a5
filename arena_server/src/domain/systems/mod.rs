// Pure simulation steps run by the session task.

pub mod pursuit;
