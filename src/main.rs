use std::process::ExitCode;

fn main() -> ExitCode {
  match card_ranker_lib::run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(error) => {
      eprintln!("Error: {}", error);
      ExitCode::FAILURE
    }
  }
}
