//! # 交互输入
//!
//! `create` 选择赝势文件、输入收敛测试范围以及 `install` 确认时需要用户输入。
//! 业务逻辑只依赖 `InputProvider`，终端输入和预设答案是两种实现。
//!
//! ## 依赖关系
//! - 被 `commands/create.rs`, `commands/install.rs` 使用

use crate::error::{Result, TeptoolsError};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// 提供下一条用户回答
pub trait InputProvider {
    /// 显示 `prompt` 并返回回答（已去除首尾空白）
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// 从终端读取
pub struct StdinInput;

impl InputProvider for StdinInput {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        read_answer(&mut io::stdin().lock(), prompt)
    }
}

/// 显示提示并读取一行；输入已结束（读到 0 字节）时返回错误
pub fn read_answer<R: BufRead>(reader: &mut R, prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout()
        .flush()
        .map_err(|e| TeptoolsError::Other(format!("Cannot write prompt: {}", e)))?;

    let mut answer = String::new();
    let read = reader
        .read_line(&mut answer)
        .map_err(|e| TeptoolsError::Other(format!("Cannot read answer: {}", e)))?;
    if read == 0 {
        println!();
        return Err(TeptoolsError::InvalidArgument(format!(
            "No answer for prompt (end of input): {}",
            prompt.trim()
        )));
    }
    Ok(answer.trim().to_string())
}

/// 按顺序返回预设回答（`--answer` 或测试）
pub struct ScriptedInput {
    answers: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// 剩余未使用的回答数
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl InputProvider for ScriptedInput {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or_else(|| {
                TeptoolsError::InvalidArgument(format!(
                    "No answer left for prompt: {}",
                    prompt.trim()
                ))
            })
    }
}

/// 先用完预设回答，再转为终端输入
pub struct ChainedInput<A, B> {
    first: A,
    then: B,
}

impl<A, B> ChainedInput<A, B> {
    pub fn new(first: A, then: B) -> Self {
        Self { first, then }
    }
}

impl<B: InputProvider> InputProvider for ChainedInput<ScriptedInput, B> {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        if self.first.remaining() > 0 {
            self.first.ask(prompt)
        } else {
            self.then.ask(prompt)
        }
    }
}

/// 询问 1 起始的序号；空回答选第一个，无效回答重新询问
pub fn ask_index(input: &mut dyn InputProvider, prompt: &str, len: usize) -> Result<usize> {
    loop {
        let answer = input.ask(prompt)?;
        if answer.is_empty() {
            return Ok(0);
        }
        match answer.parse::<usize>() {
            Ok(i) if (1..=len).contains(&i) => return Ok(i - 1),
            _ => println!("Please enter a number between 1 and {}.", len),
        }
    }
}

/// 询问一个数；无效回答重新询问
pub fn ask_number(input: &mut dyn InputProvider, prompt: &str) -> Result<f64> {
    loop {
        let answer = input.ask(prompt)?;
        match answer.parse::<f64>() {
            Ok(v) if v.is_finite() => return Ok(v),
            _ => println!("'{}' is not a number.", answer),
        }
    }
}
