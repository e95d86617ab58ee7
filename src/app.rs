//! 编排层
//!
//! 把库里的各个部件接成完整的终端考试流程：
//! 登录 → 考前须知 → 限时答题 → 成绩。
//!
//! 职责划分沿用分层约定：
//! - 进入须知页 / 考试页之前只在这里做一次认证守卫
//! - 考试页内用 `tokio::select!` 同时消费键盘命令与倒计时事件，
//!   手动交卷与到点自动交卷走同一个提交入口，由状态机守卫去重
//! - 任何接口报会话过期（401）都会退回登录页

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::api::{ApiClient, AuthApi, ExamApi};
use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError, ExamError, ValidationError};
use crate::models::{Answer, ExamResult, ProfileDraft, ProfileImage, Question};
use crate::services::instructions::ExamBriefing;
use crate::services::navigator::{self, TileState};
use crate::services::scoring::ScoringService;
use crate::store::SessionStore;
use crate::utils::format::{format_clock, format_time, truncate_text};
use crate::workflow::{AuthFlow, AuthStep, ExamEvent, ExamSession, TimerDriver};

type StdinLines = Lines<BufReader<Stdin>>;

/// 须知页上的用户选择
enum ScreenAction {
    Start,
    Logout,
    Exit,
}

/// 考试页的结束方式
#[derive(PartialEq, Eq)]
enum ExamOutcome {
    Completed,
    Abandoned,
}

/// 单条命令的处理结果
enum CommandOutcome {
    Continue,
    Submitted,
    Quit,
}

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<SessionStore>,
    auth_api: AuthApi,
    exam_api: ExamApi,
    scoring: ScoringService,
    session: Arc<Mutex<ExamSession>>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let store = Arc::new(SessionStore::new(&config));
        let client = Arc::new(ApiClient::new(&config, store.token_jar())?);

        Ok(Self {
            auth_api: AuthApi::new(Arc::clone(&client)),
            exam_api: ExamApi::new(client),
            scoring: ScoringService::new(config.scoring_policy),
            session: Arc::new(Mutex::new(ExamSession::new())),
            store,
            config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        log_startup(&self.config);

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            if !self.store.is_authenticated().await {
                self.login_screen(&mut lines).await?;
            }

            match self.authenticated_flow(&mut lines).await {
                // 用户主动登出，回登录页
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    if is_session_expired(&e) {
                        warn!("⚠️ 会话已过期，请重新登录");
                        self.session.lock().await.reset();
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        info!("👋 程序结束");
        Ok(())
    }

    /// 登录后的页面循环：须知 → 考试 → 成绩
    ///
    /// 返回 true 表示用户登出（回登录页），false 表示退出程序
    async fn authenticated_flow(&self, lines: &mut StdinLines) -> Result<bool> {
        loop {
            match self.instructions_screen(lines).await? {
                ScreenAction::Logout => return Ok(true),
                ScreenAction::Exit => return Ok(false),
                ScreenAction::Start => match self.exam_screen(lines).await? {
                    ExamOutcome::Abandoned => continue,
                    ExamOutcome::Completed => {
                        if !self.result_screen(lines).await? {
                            return Ok(false);
                        }
                    }
                },
            }
        }
    }

    // ========== ① 登录页 ==========

    async fn login_screen(&self, lines: &mut StdinLines) -> Result<()> {
        println!("\n{}", "=".repeat(60));
        println!("  登录");
        println!("{}", "=".repeat(60));

        let mut flow = AuthFlow::new(
            self.auth_api.clone(),
            Arc::clone(&self.store),
            self.config.profile_image_max_bytes,
        );

        // 手机号步骤
        let (country_code, local_number) = loop {
            let country_code = {
                let input = prompt_line(
                    lines,
                    &format!("国家区号 (默认 {}): ", self.config.default_country_code),
                )
                .await?;
                if input.is_empty() {
                    self.config.default_country_code.clone()
                } else {
                    input
                }
            };
            let local_number = prompt_line(lines, "手机号: ").await?;

            let sent = {
                let busy = self.store.busy();
                let _guard = busy.acquire();
                flow.request_otp(&country_code, &local_number).await
            };
            match sent {
                Ok(()) => break (country_code, local_number),
                Err(AppError::Validation(v)) => print_field_errors(&v),
                Err(e) => error!("{}", e),
            }
        };

        // 验证码步骤
        while flow.step() == AuthStep::OtpEntry {
            let input = prompt_line(lines, "验证码 (输入 resend 重发): ").await?;
            if input.eq_ignore_ascii_case("resend") {
                if let Err(e) = flow.request_otp(&country_code, &local_number).await {
                    error!("{}", e);
                }
                continue;
            }

            let verified = {
                let busy = self.store.busy();
                let _guard = busy.acquire();
                flow.verify_otp(&input).await
            };
            match verified {
                Ok(_) => {}
                Err(AppError::Validation(v)) => print_field_errors(&v),
                Err(e) => error!("{}", e),
            }
        }

        // 建档步骤（仅新用户）
        while flow.step() == AuthStep::ProfileCreation {
            println!("请完善你的档案：");
            let draft = ProfileDraft {
                name: prompt_line(lines, "姓名: ").await?,
                email: prompt_line(lines, "邮箱: ").await?,
                qualification: prompt_line(lines, "学历: ").await?,
                profile_image: read_profile_image(
                    &prompt_line(lines, "头像文件路径: ").await?,
                )
                .await,
            };

            let created = {
                let busy = self.store.busy();
                let _guard = busy.acquire();
                flow.create_profile(&draft).await
            };
            match created {
                Ok(()) => {}
                Err(AppError::Validation(v)) => print_field_errors(&v),
                Err(e) => error!("{}", e),
            }
        }

        Ok(())
    }

    // ========== ② 须知页 ==========

    async fn instructions_screen(&self, lines: &mut StdinLines) -> Result<ScreenAction> {
        self.ensure_authenticated().await?;

        let briefing = {
            let busy = self.store.busy();
            let _guard = busy.acquire();
            match self.exam_api.fetch_questions().await {
                Ok(response) => {
                    ExamBriefing::from_response(&response, self.config.fallback_total_time_secs)
                }
                Err(e) if e.is_session_expired() => return Err(e.into()),
                Err(e) => {
                    warn!("拉取考前须知失败，使用默认内容: {}", e);
                    ExamBriefing::fallback()
                }
            }
        };

        render_briefing(&briefing);

        loop {
            let input =
                prompt_line(lines, "输入 start 开始考试 / logout 登出 / exit 退出: ").await?;
            match input.to_lowercase().as_str() {
                "start" => return Ok(ScreenAction::Start),
                "logout" => {
                    let mut flow = AuthFlow::new(
                        self.auth_api.clone(),
                        Arc::clone(&self.store),
                        self.config.profile_image_max_bytes,
                    );
                    flow.logout().await?;
                    info!("✓ 已登出");
                    return Ok(ScreenAction::Logout);
                }
                "exit" => return Ok(ScreenAction::Exit),
                _ => println!("无法识别的输入"),
            }
        }
    }

    // ========== ③ 考试页 ==========

    async fn exam_screen(&self, lines: &mut StdinLines) -> Result<ExamOutcome> {
        self.ensure_authenticated().await?;

        // 拉取题目；失败时通知并在短暂停留后退回须知页
        let response = {
            let busy = self.store.busy();
            let _guard = busy.acquire();
            match self.exam_api.fetch_questions().await {
                Ok(response) => response,
                Err(e) if e.is_session_expired() => return Err(e.into()),
                Err(e) => {
                    error!("加载题目失败: {}", e);
                    sleep(Duration::from_millis(self.config.redirect_delay_millis)).await;
                    return Ok(ExamOutcome::Abandoned);
                }
            }
        };

        let paper = response.into_paper(self.config.fallback_total_time_secs);
        let total_time = paper.total_time;
        info!(
            "📝 {} | {} 题 | 总分 {}",
            paper.test_name,
            paper.questions.len(),
            paper.total_marks
        );

        let loaded = self
            .session
            .lock()
            .await
            .load_questions(paper.questions, total_time);
        if let Err(e) = loaded {
            error!("{}", e);
            sleep(Duration::from_millis(self.config.redirect_delay_millis)).await;
            return Ok(ExamOutcome::Abandoned);
        }

        info!("⏱ 考试开始，总时长 {}", format_time(total_time));
        render_help();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TimerDriver::start(Arc::clone(&self.session), tx);

        self.render_current().await;

        let outcome = loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(ExamEvent::TimeExpired) => {
                        warn!("⏰ 时间到，自动交卷");
                        match self.submit_session().await {
                            Ok(true) => break ExamOutcome::Completed,
                            Ok(false) => {}
                            Err(e) if e.is_session_expired() => return Err(e.into()),
                            Err(e) => error!("自动交卷失败: {}，输入 s 手动重试", e),
                        }
                    }
                    Some(ExamEvent::Tick(remaining)) => {
                        if self.config.verbose_logging || remaining % 60 == 0 || remaining <= 10 {
                            info!("⏳ 剩余时间 {}", format_time(remaining));
                        }
                    }
                    None => {}
                },
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break ExamOutcome::Abandoned;
                    };
                    match self.handle_command(line.trim(), lines).await? {
                        CommandOutcome::Continue => {}
                        CommandOutcome::Submitted => break ExamOutcome::Completed,
                        CommandOutcome::Quit => break ExamOutcome::Abandoned,
                    }
                }
            }
        };

        timer.stop();
        if outcome == ExamOutcome::Abandoned {
            // 离开考试即重置会话，在途的提交响应按版本被丢弃
            self.session.lock().await.reset();
            info!("已离开考试");
        }
        Ok(outcome)
    }

    /// 处理考试页的单条命令
    async fn handle_command(
        &self,
        command: &str,
        lines: &mut StdinLines,
    ) -> Result<CommandOutcome> {
        let (head, rest) = match command.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (command, ""),
        };

        match head.to_lowercase().as_str() {
            "" => self.render_current().await,
            "h" | "help" => render_help(),
            "a" => {
                let target = {
                    let session = self.session.lock().await;
                    session
                        .current_question()
                        .map(|q| (q.id.clone(), q.option_count()))
                };
                match target.and_then(|(id, count)| {
                    parse_option_arg(rest, count).map(|index| (id, index))
                }) {
                    None => println!("用法: a <选项字母或序号>"),
                    Some((id, index)) => {
                        match self.session.lock().await.select_answer(&id, index) {
                            Ok(()) => {}
                            Err(e) => println!("{}", e),
                        }
                        self.render_current().await;
                    }
                }
            }
            "n" => {
                self.session.lock().await.next();
                self.render_current().await;
            }
            "p" => {
                self.session.lock().await.previous();
                self.render_current().await;
            }
            "g" => match rest.parse::<usize>() {
                Ok(number) if number >= 1 => {
                    self.session.lock().await.go_to(number - 1);
                    self.render_current().await;
                }
                _ => println!("用法: g <题号>"),
            },
            "m" => {
                let current_id = {
                    let session = self.session.lock().await;
                    session.current_question().map(|q| q.id.clone())
                };
                if let Some(id) = current_id {
                    match self.session.lock().await.toggle_review_mark(&id) {
                        Ok(()) => self.render_current().await,
                        Err(e) => println!("{}", e),
                    }
                }
            }
            "v" => {
                let session = self.session.lock().await;
                render_navigator(
                    session.questions(),
                    session.current_index(),
                    session.answers(),
                    session.review_marks(),
                    session.remaining_seconds(),
                );
            }
            "c" => {
                let session = self.session.lock().await;
                match session
                    .current_question()
                    .and_then(|q| q.comprehension.as_deref())
                {
                    Some(passage) => {
                        println!("\n📖 阅读材料:\n{}\n", passage);
                    }
                    None => println!("本题没有阅读材料"),
                }
            }
            "s" => return self.confirm_and_submit(lines).await,
            "q" => return Ok(CommandOutcome::Quit),
            _ => println!("无法识别的命令，输入 h 查看帮助"),
        }

        Ok(CommandOutcome::Continue)
    }

    /// 交卷确认 + 提交
    ///
    /// 还有剩余时间时先给出确认（与须知一致）；时间已到则直接提交
    async fn confirm_and_submit(&self, lines: &mut StdinLines) -> Result<CommandOutcome> {
        let (remaining, summary, total) = {
            let session = self.session.lock().await;
            (
                session.remaining_seconds(),
                navigator::summarize(
                    session.questions(),
                    session.answers(),
                    session.review_marks(),
                ),
                session.questions().len(),
            )
        };

        if remaining > 0 {
            println!("\n确认交卷？");
            println!("  剩余时间: {}", format_time(remaining));
            println!("  总题数:   {}", total);
            println!("  已作答:   {:03}", summary.answered);
            println!("  已标记:   {:03}", summary.marked);
            let input = prompt_line(lines, "确认请输入 y: ").await?;
            if !input.eq_ignore_ascii_case("y") {
                println!("已取消");
                return Ok(CommandOutcome::Continue);
            }
        }

        match self.submit_session().await {
            Ok(true) => Ok(CommandOutcome::Submitted),
            Ok(false) => Ok(CommandOutcome::Continue),
            Err(e) if e.is_session_expired() => Err(e.into()),
            Err(e) => {
                // 提交失败会话保持 Active，答案还在，可重试
                error!("{}", e);
                Ok(CommandOutcome::Continue)
            }
        }
    }

    /// 统一的提交入口（手动交卷与自动交卷共用）
    ///
    /// 状态机守卫保证并发调用只产生一次网络提交；
    /// 返回 true 表示本次调用完成了交卷
    async fn submit_session(&self) -> AppResult<bool> {
        let ticket = { self.session.lock().await.begin_submit() };
        let Some(ticket) = ticket else {
            // 守卫生效：已在提交或已交卷
            return Ok(false);
        };

        info!("📤 正在提交答卷 ({} 题)...", ticket.entries.len());
        let busy = self.store.busy();
        let _guard = busy.acquire();

        match self.exam_api.submit_answers(&ticket.entries).await {
            Ok(response) if response.success => {
                let mut session = self.session.lock().await;
                let result =
                    self.scoring
                        .resolve(session.questions(), session.answers(), response);
                match session.complete_submit(ticket.epoch, result) {
                    Ok(()) => {
                        info!("✓ 交卷成功");
                        Ok(true)
                    }
                    // 会话已被重置，迟到的结果直接丢弃
                    Err(e) => {
                        warn!("{}", e);
                        Ok(false)
                    }
                }
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "提交失败".to_string());
                if self.rollback_submit(ticket.epoch).await {
                    Err(AppError::Exam(ExamError::SubmissionFailed { message }))
                } else {
                    Ok(false)
                }
            }
            Err(e) => {
                if self.rollback_submit(ticket.epoch).await {
                    Err(e)
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// 提交失败后回到 Active；会话已重置时返回 false
    async fn rollback_submit(&self, epoch: u64) -> bool {
        self.session.lock().await.fail_submit(epoch).is_ok()
    }

    // ========== ④ 成绩页 ==========

    /// 返回 true 表示重考（会话已重置），false 表示退出程序
    async fn result_screen(&self, lines: &mut StdinLines) -> Result<bool> {
        {
            let session = self.session.lock().await;
            if let Some(result) = session.result() {
                render_result(result);
            }
        }

        loop {
            let input = prompt_line(lines, "输入 done 重考 / exit 退出: ").await?;
            match input.to_lowercase().as_str() {
                "done" => {
                    self.session.lock().await.reset();
                    return Ok(true);
                }
                "exit" => return Ok(false),
                _ => println!("无法识别的输入"),
            }
        }
    }

    // ========== 守卫与渲染 ==========

    /// 统一的认证前置守卫：进入须知页 / 考试页前各查一次
    async fn ensure_authenticated(&self) -> AppResult<()> {
        if self.store.is_authenticated().await {
            Ok(())
        } else {
            Err(AppError::Auth(AuthError::SessionExpired))
        }
    }

    async fn render_current(&self) {
        let session = self.session.lock().await;
        let Some(question) = session.current_question() else {
            return;
        };
        let answer = session.answers().get(&question.id);
        let marked = session
            .review_marks()
            .get(&question.id)
            .copied()
            .unwrap_or(false);
        render_question(
            session.current_index(),
            session.questions().len(),
            question,
            answer,
            marked,
        );
    }
}

// ========== 输入辅助 ==========

async fn prompt_line(lines: &mut StdinLines, prompt: &str) -> Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    match lines.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => bail!("输入流已关闭"),
    }
}

/// 选项参数：既接受序号（1 起）也接受字母（A 起）
fn parse_option_arg(arg: &str, option_count: usize) -> Option<usize> {
    if arg.is_empty() {
        return None;
    }
    if let Ok(number) = arg.parse::<usize>() {
        return (1..=option_count).contains(&number).then(|| number - 1);
    }
    let mut chars = arg.chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let index = (letter.to_ascii_uppercase() as u8).checked_sub(b'A')? as usize;
    (index < option_count).then_some(index)
}

async fn read_profile_image(path: &str) -> Option<ProfileImage> {
    if path.is_empty() {
        return None;
    }
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let file_name = std::path::Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "profile.jpg".to_string());
            Some(ProfileImage { file_name, bytes })
        }
        Err(e) => {
            warn!("读取头像失败 ({}): {}", path, e);
            None
        }
    }
}

fn is_session_expired(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<AppError>()
        .map(|e| e.is_session_expired())
        .unwrap_or(false)
}

// ========== 渲染辅助 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - MCQ 考试客户端");
    info!("📡 服务地址: {}", config.api_base_url);
    info!("📊 判分策略: {:?}", config.scoring_policy);
    info!("{}", "=".repeat(60));
}

fn print_field_errors(validation: &ValidationError) {
    for field in &validation.fields {
        println!("  ✗ {}", field);
    }
}

fn render_briefing(briefing: &ExamBriefing) {
    println!("\n{}", "=".repeat(60));
    println!("  {}", briefing.title);
    println!("{}", "=".repeat(60));
    println!(
        "  总题数: {}    总分: {}    总时长: {}",
        briefing.total_questions,
        briefing.total_marks,
        format_clock(briefing.total_time)
    );
    println!("\n考试须知:");
    for (index, rule) in briefing.rules.iter().enumerate() {
        println!("  {}. {}", index + 1, rule);
    }
    println!();
}

fn render_help() {
    println!("命令: a <选项>=作答  n=下一题  p=上一题  g <题号>=跳转");
    println!("      m=标记待查  v=答题卡  c=阅读材料  s=交卷  q=离开  h=帮助");
}

fn render_question(
    index: usize,
    total: usize,
    question: &Question,
    answer: Option<&Answer>,
    marked: bool,
) {
    println!("\n{}", "─".repeat(60));
    println!(
        "第 {}/{} 题{}",
        index + 1,
        total,
        if marked { "  [已标记]" } else { "" }
    );
    println!("{}", question.prompt);
    if let Some(image) = &question.image {
        println!("🖼 配图: {}", image);
    }
    if question.comprehension.is_some() {
        println!("📖 本题附阅读材料，输入 c 查看");
    }
    println!();
    for (i, option) in question.options.iter().enumerate() {
        let letter = (b'A' + i as u8) as char;
        let chosen = answer.map(|a| a.answer_index == i).unwrap_or(false);
        println!(
            "  {} {}. {}",
            if chosen { "▶" } else { " " },
            letter,
            option.option
        );
    }
}

fn render_navigator(
    questions: &[Question],
    current_index: usize,
    answers: &HashMap<String, Answer>,
    review_marks: &HashMap<String, bool>,
    remaining: u32,
) {
    let summary = navigator::summarize(questions, answers, review_marks);
    println!("\n{}", "─".repeat(60));
    println!(
        "答题卡  {:02}/{:03}    剩余时间 {}",
        summary.answered,
        questions.len(),
        format_time(remaining)
    );
    println!(
        "已答 {}  未答 {}  已标记 {}  已答且标记 {}",
        summary.answered, summary.unanswered, summary.marked, summary.answered_and_marked
    );

    let states = navigator::tile_states(questions, current_index, answers, review_marks);
    for (row_start, chunk) in states.chunks(10).enumerate().map(|(i, c)| (i * 10, c)) {
        let row = chunk
            .iter()
            .enumerate()
            .map(|(offset, state)| {
                let symbol = match state {
                    TileState::Answered => '✔',
                    TileState::Marked => '★',
                    TileState::NotAttended => '✘',
                    TileState::Unvisited => '·',
                };
                format!("{:>3}{}", row_start + offset + 1, symbol)
            })
            .collect::<Vec<_>>()
            .join(" ");
        println!("  {}", row);
    }
    println!("  ✔=已答  ★=标记待查  ✘=看过未答  ·=未到达");
}

fn render_result(result: &ExamResult) {
    println!("\n{}", "=".repeat(60));
    println!("  考试成绩");
    println!("{}", "=".repeat(60));
    println!("  得分:       {} / {}", result.correct, result.total);
    println!("  总题数:     {}", result.total);
    println!("  答对:       {}", result.correct);
    println!("  答错:       {}", result.incorrect);
    println!("  未作答:     {}", result.unanswered);
    println!("  分数:       {}", result.score);
    if let Some(submitted_at) = &result.submitted_at {
        println!("  交卷时间:   {}", truncate_text(submitted_at, 40));
    }
    println!("{}", "=".repeat(60));
}
