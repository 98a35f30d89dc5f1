use once_cell::sync::Lazy;

use flowsmith_core::rules::RULES;

/// A worked request/answer pair shown to the model.
pub struct Example {
    pub title: &'static str,
    pub query: &'static str,
    pub code: &'static str,
}

pub const EXAMPLES: &[Example] = &[
    Example {
        title: "Class Diagram (detailed request)",
        query: "Create a detailed class diagram for a banking system with an Account base class with a balance attribute, SavingsAccount and CheckingAccount subclasses, a Transaction class with relationships, and proper visibility modifiers and data types",
        code: "classDiagram
    class Account {
        - balance: double
        + deposit(amount: double)
        + withdraw(amount: double)
    }

    class SavingsAccount {
        - interestRate: double
        + calculateInterest(): double
    }

    class CheckingAccount {
        - overdraftLimit: double
    }

    class Transaction {
        - type: string
        - amount: double
        - date: Date
        + execute()
    }

    Account <|-- SavingsAccount
    Account <|-- CheckingAccount
    Account *-- Transaction : hasTransactions",
    },
    Example {
        title: "Class Diagram (no details given)",
        query: "Create a class diagram for a banking system",
        code: "classDiagram
    class Bank {
        + name: string
        + location: string
    }

    class Customer {
        + name: string
        + accountNumber: string
    }

    class Account {
        + balance: double
        + deposit(amount: double)
        + withdraw(amount: double)
    }

    Bank *-- Customer : has
    Customer *-- Account : owns",
    },
    Example {
        title: "Flowchart",
        query: "Create a flowchart for a banking process",
        code: "graph TD
    Start --> Transaction[Perform Transaction]
    Transaction --> End",
    },
    Example {
        title: "Flowchart (detailed)",
        query: "Create a detailed flowchart for a banking transaction",
        code: "graph TD
    Start --> |Select Transaction| Decision{Deposit or Withdraw}
    Decision -->|Deposit| Process[Process Deposit]
    Decision -->|Withdraw| CheckBalance{Enough Balance?}
    CheckBalance -->|Yes| ProcessWithdraw[Process Withdrawal]
    CheckBalance -->|No| Reject[Reject Transaction]
    Process --> UpdateBalance[Update Balance]
    ProcessWithdraw --> UpdateBalance
    UpdateBalance --> End
    Reject --> End",
    },
    Example {
        title: "Sequence Diagram",
        query: "Create a sequence diagram for a user login process",
        code: "sequenceDiagram
    participant User
    participant System
    User->>System: Login Request
    System-->>User: Login Success",
    },
    Example {
        title: "ER Diagram",
        query: "Create an ER diagram for an order management system",
        code: "erDiagram
    CUSTOMER ||--o{ ORDER : places
    ORDER ||--|{ PRODUCT : contains",
    },
    Example {
        title: "Gantt Diagram",
        query: "Create a Gantt diagram for a project timeline",
        code: "gantt
    dateFormat  YYYY-MM-DD
    title Project Timeline
    section Planning
    Task A :a1, 2023-01-01, 10d
    section Development
    Task B :after a1, 20d",
    },
    Example {
        title: "Mindmap",
        query: "Create a mindmap for brainstorming ideas",
        code: "mindmap
  root((Central Idea))
    branch1((Sub Idea 1))
    branch2((Sub Idea 2))",
    },
    Example {
        title: "State Diagram",
        query: "Create a state diagram for a ticket booking system",
        code: "stateDiagram-v2
    [*] --> Idle
    Idle --> Booking
    Booking --> Confirmed
    Confirmed --> [*]",
    },
    Example {
        title: "Timeline",
        query: "Create a timeline diagram for company milestones",
        code: "timeline
    title Company Milestones
    2023-01-01 : Founded
    2023-06-01 : First Product Launch",
    },
    Example {
        title: "Git Graph",
        query: "Create a Git diagram for a feature branch workflow",
        code: "gitGraph
    commit
    branch feature
    commit
    checkout feature
    commit
    merge feature",
    },
    Example {
        title: "C4 Context Diagram",
        query: "Create a C4 context diagram for an e-commerce system",
        code: r#"C4Context
    Person(customer, "Customer", "A customer")
    System(system, "E-Commerce Platform", "Handles orders and payments")
    Rel(customer, system, "Uses")"#,
    },
    Example {
        title: "Sankey Diagram",
        query: "Create a Sankey diagram for energy flow",
        code: "sankey
    A[Energy Source] -- 100 --> B[Conversion]
    B -- 60 --> C[Useful Energy]
    B -- 40 --> D[Losses]",
    },
    Example {
        title: "Block Diagram",
        query: "Create a block diagram for a simple system architecture",
        code: "flowchart LR
    A[Component A] --> B[Component B]
    B --> C[Component C]",
    },
    Example {
        title: "Pie Chart",
        query: "Create a pie chart for market share distribution",
        code: r#"pie
    title Market Share
    "Product A" : 40
    "Product B" : 35
    "Product C" : 25"#,
    },
    Example {
        title: "Quadrant Chart",
        query: "Create a quadrant diagram for project evaluation",
        code: "quadrantChart
    title Reach and engagement of campaigns
    x-axis Low Reach --> High Reach
    y-axis Low Engagement --> High Engagement
    quadrant-1 We should expand
    quadrant-2 Need to promote
    quadrant-3 Re-evaluate
    quadrant-4 May be improved
    Campaign A: [0.3, 0.6]
    Campaign B: [0.45, 0.23]
    Campaign C: [0.57, 0.69]
    Campaign D: [0.78, 0.34]",
    },
    Example {
        title: "Requirement Diagram",
        query: "Create a requirement diagram for system specifications",
        code: r#"requirementDiagram
    requirement req1 {
      id: 1
      text: "System shall support user authentication"
    }"#,
    },
    Example {
        title: "User Journey",
        query: "Create a user journey diagram for onboarding new users",
        code: "journey
    title User Onboarding
    section Registration
      Click Sign Up: 5: User
      Fill Form: 3: User
      Confirm Email: 2: System",
    },
    Example {
        title: "XY Chart",
        query: "Create an XY diagram for plotting data points",
        code: r#"xyChart
    xAxis label: "Time"
    yAxis label: "Value"
    data: [ [0, 1], [1, 2], [2, 3] ]"#,
    },
];

/// The answer the model is expected to give for `code`: a one-line JSON object.
pub fn expected_output(code: &str) -> String {
    serde_json::json!({ "code": code }).to_string()
}

static SYSTEM_PROMPT: Lazy<String> = Lazy::new(build_system_prompt);

pub fn system_prompt() -> &'static str {
    &SYSTEM_PROMPT
}

fn build_system_prompt() -> String {
    let mut out = String::with_capacity(8192);

    out.push_str("{\"code\": \"mermaid_code\"}\n\n");
    out.push_str(
        "You turn diagram requests into Mermaid markup. Generate STRICT JSON with PROPER SYNTAX. \
The output must always follow this structure:\n\n{\n  \"code\": \"mermaid_code\"\n}\n\n\
Below is one example per supported diagram type. Use ONLY double quotes and escape newlines \
with \\n. Do NOT use markdown formatting.\n\n",
    );

    for (i, example) in EXAMPLES.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}:\nExample Query:\n\"{}\"\n\nExpected Output:\n{}\n\n",
            i + 1,
            example.title,
            example.query,
            expected_output(example.code)
        ));
    }

    out.push_str("RULES:\n");
    out.push_str(RULES);
    out
}
