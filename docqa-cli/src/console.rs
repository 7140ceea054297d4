//! Interactive question loop.

use anyhow::Result;
use docqa_rag::QueryPipeline;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::print_answer;

const PROMPT: &str = "question> ";

/// What the console should do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Quit,
    Ask(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Skip,
        "exit" | "quit" | ":q" => Input::Quit,
        question => Input::Ask(question),
    }
}

/// Read questions until `exit`, Ctrl-C or Ctrl-D and print each answer.
///
/// A failed question is reported and the loop continues.
pub async fn run(pipeline: &QueryPipeline, max_images: usize) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Ask a question about your documents. Type 'exit' to quit.");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let question = match classify(&line) {
            Input::Skip => continue,
            Input::Quit => break,
            Input::Ask(question) => question,
        };
        let _ = editor.add_history_entry(question);

        match pipeline.answer_question(question, max_images).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => {
                tracing::error!(error = %e, "failed to answer question");
                eprintln!("Error: {e}");
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
