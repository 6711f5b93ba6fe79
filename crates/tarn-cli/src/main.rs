use std::fs;

use owo_colors::OwoColorize;
use tarn_interpreter::{EmbeddedRegistry, Interpreter};
use tarn_lexer::Lexer;
use tarn_parser::parse_with_handler;
use tarn_syntax::error::Error;

fn render_error(kind: &str, source: &str, err: &Error) {
    eprintln!("{}: {}", kind.red().bold(), err.msg.red());
    if let Some(pos) = err.pos {
        eprintln!("  --> line {}, column {}", pos.line, pos.column);
        if let Some(src_line) = source.lines().nth(pos.line - 1) {
            let line_num_str = format!("{:3} | ", pos.line);
            eprintln!("     |");
            eprintln!("{}{}", line_num_str.bright_black(), src_line);

            let mut marker = String::new();
            marker.push_str(&" ".repeat(line_num_str.len()));
            if pos.column > 1 {
                marker.push_str(&" ".repeat(pos.column - 1));
            }
            marker.push('^');
            eprintln!("{}{}", marker.red(), " error here".red());
            eprintln!("     |");
        }
    }

    // Add helpful suggestions based on common errors
    if err.msg.contains("undefined variable") {
        eprintln!(
            "{}",
            "Help: Did you forget to declare this variable, e.g. 'int x := 0'?".yellow()
        );
    } else if err.msg.contains("undefined function") {
        eprintln!(
            "{}",
            "Help: Check the spelling, or whether the function is defined. Embedded functions: print, println, modulo, sqrt, power.".yellow()
        );
    } else if err.msg.contains("type mismatch") {
        eprintln!(
            "{}",
            "Help: Make sure the value matches the declared type, or convert it with '-> type'.".yellow()
        );
    } else if err.msg.contains("division by zero") {
        eprintln!(
            "{}",
            "Help: Check that the divisor is not zero before dividing.".yellow()
        );
    } else if err.msg.contains("maximum recursion depth") {
        eprintln!(
            "{}",
            "Help: Give the recursive function a reachable base case.".yellow()
        );
    } else if err.msg.contains("never closed") {
        eprintln!(
            "{}",
            "Help: Every \" needs a matching closing \".".yellow()
        );
    }
}

fn parse_flags(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == "--tokens" || a == "-t")
}

fn parse_path(args: &[String]) -> Option<&str> {
    args.iter()
        .skip(1)
        .find(|a| !a.starts_with('-'))
        .map(|a| a.as_str())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let tokens_mode = parse_flags(&args);

    let path = match parse_path(&args) {
        Some(p) => p,
        None => {
            eprintln!("usage: tarn [--tokens] <file.tarn>");
            std::process::exit(2);
        }
    };

    let src = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "{}: {}",
                "error".red().bold(),
                format!("Failed to read {}: {}", path, e).red()
            );
            std::process::exit(1);
        }
    };

    let mut lexer = Lexer::new(&src);
    let tokens = match lexer.tokenize() {
        Ok(t) => t,
        Err(e) => {
            render_error("Lex error", &src, &e);
            std::process::exit(1);
        }
    };

    if tokens_mode {
        for token in &tokens {
            println!("{:>8}  {}", token.pos.to_string(), token.kind);
        }
        return;
    }

    let program = match parse_with_handler(tokens, |e| render_error("Parse error", &src, e)) {
        Some(p) => p,
        None => std::process::exit(1),
    };

    let mut interp = Interpreter::new(program, EmbeddedRegistry::standard());
    if let Err(e) = interp.run() {
        render_error("Runtime error", &src, &e);
        std::process::exit(1);
    }
}
