//! Terminal front-end for an exam: one question at a time on stdin/stdout.

use std::error::Error;
use std::io::{self, Write};
use std::time::Instant;

use services::{
    AnswerOutcome, ExamError, ExamFlow, ExamLoopService, ExamReport, ExamSession, ExamSetup,
    FlowError,
};
use study_core::model::{ExamQuestion, QuestionBank};

type Input = io::Lines<io::StdinLock<'static>>;

/// Run exams until the learner declines another one.
pub(crate) async fn run(
    exam_loop: &ExamLoopService,
    bank: &QuestionBank,
    setup: ExamSetup,
) -> Result<(), Box<dyn Error>> {
    let mut input = io::stdin().lines();
    let mut flow = ExamFlow::new(setup);

    loop {
        let session = exam_loop.start_exam(bank, flow.setup()).await?;
        println!(
            "\n{} questions. Answer with the option number, or q to quit.",
            session.total()
        );
        flow.begin(session)?;

        if !play(exam_loop, flow.session_mut()?, &mut input).await? {
            println!("Exam abandoned; progress was not changed.");
            return Ok(());
        }

        if let Some(session) = flow.session() {
            print_duration(session);
        }
        flow.finish()?;
        if let Some(report) = flow.report() {
            print_report(report);
        }
        save_pending_results(exam_loop, &mut flow, &mut input).await?;

        if !confirm(&mut input, "Take another exam? [y/N] ")? {
            return Ok(());
        }
        flow.retry()?;
    }
}

/// Returns false if the learner quit before the last answer.
async fn play(
    exam_loop: &ExamLoopService,
    session: &mut ExamSession,
    input: &mut Input,
) -> Result<bool, Box<dyn Error>> {
    loop {
        let Some(question) = session.current_question() else {
            return Ok(true);
        };
        print_question(session, question);
        let options = question.options().len();

        let asked = Instant::now();
        let mut ticked = 0_u32;
        let outcome = loop {
            prompt("> ")?;
            let Some(line) = input.next().transpose()? else {
                return Ok(false);
            };

            // The countdown only advances when input arrives.
            let elapsed = u32::try_from(asked.elapsed().as_secs()).unwrap_or(u32::MAX);
            let delta = elapsed.saturating_sub(ticked);
            ticked = elapsed;
            match exam_loop.tick(session, delta).await {
                Ok(Some(outcome)) => {
                    println!("Time's up!");
                    break outcome;
                }
                Ok(None) => {}
                Err(err) => return settle_error(session, err),
            }

            let line = line.trim();
            if line.eq_ignore_ascii_case("q") {
                return Ok(false);
            }
            let Some(choice) = line
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=options).contains(n))
            else {
                println!("Enter a number from 1 to {options}.");
                continue;
            };

            match exam_loop.answer_current(session, choice - 1).await {
                Ok(outcome) => break outcome,
                Err(err) => return settle_error(session, err),
            }
        };

        print_feedback(session, &outcome);
        if outcome.is_complete {
            return Ok(true);
        }
        session.advance()?;
    }
}

/// Offer to retry a failed save until it succeeds or the learner gives up.
async fn save_pending_results(
    exam_loop: &ExamLoopService,
    flow: &mut ExamFlow,
    input: &mut Input,
) -> Result<(), Box<dyn Error>> {
    while flow.report().is_some_and(|report| !report.persisted) {
        if !confirm(input, "Retry saving progress? [y/N] ")? {
            println!(
                "These results are not saved; the next exam starts from the last saved progress."
            );
            return Ok(());
        }
        match exam_loop.save_results(flow).await {
            Ok(()) => println!("Progress saved."),
            Err(FlowError::Exam(ExamError::Storage(err))) => {
                log::warn!("saving progress failed again: {err}");
                println!("Saving failed: {err}");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// A failed final save still ends the exam; the report shows it was not persisted.
fn settle_error(session: &ExamSession, err: ExamError) -> Result<bool, Box<dyn Error>> {
    match err {
        ExamError::Storage(storage) if session.is_complete() => {
            log::warn!("exam finished but progress was not saved: {storage}");
            Ok(true)
        }
        other => Err(other.into()),
    }
}

fn print_duration(session: &ExamSession) {
    if let Some(done) = session.completed_at() {
        let secs = (done - session.started_at()).num_seconds().max(0);
        println!("\nTime taken: {}m {:02}s", secs / 60, secs % 60);
    }
}

fn print_question(session: &ExamSession, question: &ExamQuestion) {
    println!();
    let limit = session.timer().limit_secs();
    if limit > 0 {
        println!(
            "Question {}/{} [{}, {limit}s]",
            session.current_index() + 1,
            session.total(),
            question.difficulty()
        );
    } else {
        println!(
            "Question {}/{} [{}]",
            session.current_index() + 1,
            session.total(),
            question.difficulty()
        );
    }
    println!("{}", question.question());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
}

fn print_feedback(session: &ExamSession, outcome: &AnswerOutcome) {
    let feedback = &outcome.feedback;
    let question = &session.questions()[feedback.question_index];
    if feedback.is_correct {
        println!("Correct!");
    } else {
        println!(
            "Incorrect. The answer is {}. {}",
            feedback.correct_index + 1,
            question.correct_option()
        );
    }
    if !feedback.explanation.is_empty() {
        println!("{}", feedback.explanation);
    }
    println!(
        "Score {}/{}, streak {}",
        session.tally().correct_count(),
        session.answered_count(),
        session.tally().session_streak()
    );
}

fn print_report(report: &ExamReport) {
    let result = &report.result;
    println!();
    println!(
        "Finished: {}/{} correct ({:.0}%), +{} points",
        result.correct_count(),
        result.question_count(),
        result.percentage(),
        result.points_earned()
    );
    for badge in &report.new_badges {
        println!("New badge: {}", badge.title());
    }
    println!(
        "Total points {}, streak {} (best {})",
        report.progress.points(),
        report.progress.current_streak(),
        report.progress.best_streak()
    );
    if !report.persisted {
        println!("Progress could not be saved.");
    }
}

fn prompt(text: &str) -> io::Result<()> {
    print!("{text}");
    io::stdout().flush()
}

fn confirm(input: &mut Input, question: &str) -> io::Result<bool> {
    prompt(question)?;
    let answer = input.next().transpose()?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
