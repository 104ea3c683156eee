//! Curated term lists used by the preprocessor, topic sweep, labeler and reporters.
//!
//! Everything here is plain data. `LabelSets::default()` builds it once at
//! start-up and stages borrow it; nothing reads these lists through globals.
//! Category vectors are ordered: on equal scores the earlier category wins.

use ahash::AHashSet;

/// A named keyword list (challenge category or lifecycle stage).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self { name: name.to_string(), keywords: owned(keywords) }
    }
}

/// Classical vs quantum algorithm family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlgorithmType {
    Classical,
    Quantum,
}

impl AlgorithmType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmType::Classical => "Classical",
            AlgorithmType::Quantum => "Quantum",
        }
    }
}

#[derive(Clone, Debug)]
pub struct LabelSets {
    pub quantum_tools: Vec<String>,
    pub quantum_algorithms: Vec<String>,
    pub classical_algorithms: Vec<String>,
    /// Variant spelling -> canonical algorithm name.
    pub algorithm_aliases: Vec<(String, String)>,
    pub algorithm_types: Vec<(String, AlgorithmType)>,
    pub challenge_categories: Vec<Category>,
    pub lifecycle_stages: Vec<Category>,
    /// Tools kept in the tool report.
    pub focus_tools: Vec<String>,
    /// Algorithms kept in the filtered algorithm metrics table.
    pub focus_algorithms: Vec<String>,
    /// Lowercased phrases used to select relevant questions; single-token
    /// entries are also exempt from the low-frequency filter.
    pub filter_keywords: AHashSet<String>,
    /// Tokens duplicated before dictionary construction. Compared verbatim.
    pub boost_keywords: AHashSet<String>,
    pub domain_stopwords: Vec<String>,
}

fn owned(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

impl LabelSets {
    /// Tools and algorithms in one list, quantum first (mention detection order).
    pub fn all_algorithms(&self) -> Vec<String> {
        self.quantum_algorithms.iter().chain(self.classical_algorithms.iter()).cloned().collect()
    }

    pub fn canonical_algorithm(&self, name: &str) -> String {
        let n = name.trim().to_lowercase();
        self.algorithm_aliases
            .iter()
            .find(|(alias, _)| *alias == n)
            .map(|(_, canon)| canon.clone())
            .unwrap_or(n)
    }

    pub fn algorithm_type(&self, name: &str) -> Option<AlgorithmType> {
        self.algorithm_types.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }
}

impl Default for LabelSets {
    fn default() -> Self {
        let quantum_tools = owned(&[
            "openqkd", "qkdnet", "secoqc", "qunetsim", "netsquid", "simulaqron", "squanch",
            "liboqs", "oqs", "kyber", "dilithium", "frodo", "ntru", "rainbow", "mceliece", "pqc-crypto",
            "qiskit", "cirq", "qdk", "qutip", "stim", "projectq",
            "pennylane", "openqasm", "braket", "forest",
        ]);

        let quantum_algorithms = owned(&[
            "bb84", "e91", "qkd", "shor", "grover", "vqe", "qaoa",
            "quantum key distribution", "shor code", "steane code", "surface code",
            "magic state distillation", "zero noise extrapolation", "quantum phase estimation", "qpe",
            "quantum fourier transform", "qft", "quantum teleportation", "hhl", "amplitude amplification",
            "swap test", "quantum annealing", "quantum cryptography", "quantum secure communication",
            "quantum authentication", "quantum digital signature", "quantum error correction", "stabilizer code",
        ]);

        let classical_algorithms = owned(&[
            "rsa", "aes", "sha-2", "sha-3", "hmac", "ecc",
            "ntru", "kyber", "frodo", "rainbow", "mceliece", "sphincs", "xmss", "lattice", "post quantum",
        ]);

        let algorithm_aliases = [
            ("shor's algorithm", "shor"),
            ("shors", "shor"),
            ("shor algorithm", "shor"),
            ("grover's algorithm", "grover"),
            ("grovers", "grover"),
            ("rsa encryption", "rsa"),
            ("quantum key distribution", "qkd"),
            ("quantum fourier transform", "qft"),
            ("quantum phase estimation", "qpe"),
            ("post-quantum encryption", "post-quantum signature"),
            ("post-quantum signatures", "post-quantum signature"),
        ]
        .iter()
        .map(|(a, c)| (a.to_string(), c.to_string()))
        .collect();

        use AlgorithmType::{Classical, Quantum};
        let algorithm_types = [
            ("shor", Quantum), ("grover", Quantum), ("bb84", Quantum), ("rsa", Classical),
            ("aes", Classical), ("lattice", Classical), ("ecc", Classical), ("nist pqc", Classical),
            ("qkd", Quantum), ("simon", Quantum), ("hhl", Quantum), ("post-quantum signature", Classical),
            ("b92", Quantum), ("hash-based cryptography", Classical), ("qft", Quantum), ("vqe", Quantum),
            ("qpe", Quantum), ("qaoa", Quantum), ("kyber", Classical), ("rainbow", Classical),
            ("ntru", Classical), ("e91", Quantum),
        ]
        .iter()
        .map(|(n, t)| (n.to_string(), *t))
        .collect();

        let challenge_categories = vec![
            Category::new("Technical", &[
                "error", "noise", "decoherence", "leakage", "crosstalk", "fault", "stability",
                "latency", "scalability", "precision", "synchronization", "gate fidelity", "calibration",
                "hardware limitation", "measurement error", "control error", "signal loss",
                "thermal noise", "qubit failure", "readout error", "timing issue", "circuit noise",
                "gate noise", "hardware error", "depolarizing noise",
            ]),
            Category::new("Implementation", &[
                "implementation", "benchmark", "simulation", "verification", "circuit depth",
                "compilation", "runtime", "deployment", "debugging", "compiler issue",
                "resource overhead", "optimization", "test case", "gate decomposition", "device mismatch",
                "tableau", "conversion", "encoding", "decoding", "circuit transformation", "generate circuit",
            ]),
            Category::new("Security", &[
                "attack", "vulnerability", "eavesdropping", "authentication", "privacy", "key loss",
                "qkd failure", "side-channel", "protocol breach", "intercept", "spoofing",
                "key exhaustion", "tampering", "message forgery", "quantum threat", "quantum-safe",
                "post-quantum", "cryptographic failure", "data breach", "secure transmission",
                "man-in-the-middle", "quantum intercept", "quantum spoofing",
            ]),
            Category::new("General", &[
                "problem", "issue", "challenge", "difficult", "limitation", "unstable",
                "complex", "bug", "error-prone", "confusing", "unclear", "not working",
                "unexpected result", "no output",
            ]),
        ];

        let lifecycle_stages = vec![
            Category::new("Implementation", &[
                "implementation", "simulate", "compile", "execute", "run", "build", "code",
                "workflow", "layout", "gates", "circuit", "qubit register", "noise model",
                "qaoa", "vqe", "mixer", "qiskit", "pennylane", "qulacs", "runtime",
                "ibm hardware", "test circuit", "compile error", "execution", "generate", "build circuit",
                "construct", "create", "design", "manual encoding", "simulate attack", "test security",
                "security test", "protocol implementation", "secure protocol", "simulate qkd",
            ]),
            Category::new("Development", &[
                "error", "noise", "calibration", "correction", "fault", "leakage",
                "stabilizer", "decoherence", "crosstalk", "gate fidelity", "testbed", "compiler",
                "debug", "runtime", "latency", "circuit", "qubit", "error mitigation",
                "measurement", "stability", "timing", "simulation", "hardware limitation",
            ]),
            Category::new("Adoption", &[
                "adoption", "deployment", "integration", "standard", "interoperability",
                "secure system", "compliance", "real-world", "use case", "production",
                "framework", "product", "enterprise", "design pattern", "application",
                "system design", "rollout", "commercial", "deployment strategy",
            ]),
            Category::new("Learning", &[
                "learning", "tutorial", "basics", "beginner", "introduction", "how to",
                "understand", "what is", "getting started", "guide", "overview",
                "help", "simple explanation", "definition", "difference between",
                "step by step", "documentation", "confused", "resources", "explain",
            ]),
            Category::new("Exploration", &[
                "future", "potential", "research", "exploration", "compare", "comparison",
                "alternative", "limitation", "theory", "proposal", "approach",
                "open problem", "state of the art", "novel", "suggestion", "hypothesis",
                "evaluation", "versus", "paper", "survey", "idea", "why", "explain", "reason",
                "intuition", "interpret", "meaning", "how does", "what happens if",
            ]),
        ];

        let focus_tools = owned(&[
            "qiskit", "stim", "cirq", "openqasm", "qutip", "braket",
            "simulaqron", "projectq", "oqs", "kyber", "dilithium", "rainbow", "ntru",
        ]);
        let focus_algorithms = owned(&[
            "shor", "grover", "qft", "rsa", "qkd", "vqe", "qpe", "ecc", "qaoa", "hhl", "kyber", "rainbow", "ntru",
        ]);

        let filter_keywords = [
            "error correction", "surface code", "steane code", "shor code", "quantum parity check",
            "syndrome measurement", "stabilizer", "fault tolerant", "magic state distillation",
            "state injection model", "zero noise extrapolation", "probabilistic error cancellation",
            "measurement error mitigation", "vqe", "quantum key distribution", "BB84", "E91", "NTRU",
            "Rainbow", "homomorphic encryption", "quantum shielding", "cirq", "randomised benchmarking",
            "depolarizing channel", "decoherence", "toric code", "stim", "color code", "lattice structure",
            "encryption", "no cloning theorem", "quantum teleportation", "bell test", "entanglement purification",
            "dynamical decoupling", "cross talk", "qubit leakage", "quantum gate calibration", "qkd", "noise",
            "error", "surface", "steane", "shor", "toric",
        ]
        .iter()
        .map(|s| s.to_lowercase())
        .collect();

        let boost_keywords = [
            "error correction", "surface code", "steane code", "shor code", "quantum parity check",
            "syndrome measurement", "stabilizer", "fault-tolerant", "magic state distillation",
            "state injection model", "zero noise extrapolation", "probabilistic error cancellation",
            "measurement error mitigation", "vqe", "quantum key distribution", "BB84", "E91", "NTRU",
            "Rainbow", "homomorphic encryption", "quantum shielding", "Cirq", "randomized benchmarking",
            "depolarizing channel", "decoherence", "toric code", "stim", "color code", "lattice structure",
            "encryption", "no cloning theorem", "quantum teleportation", "Bell test", "entanglement purification",
            "dynamical decoupling", "cross talk", "qubit leakage", "quantum gate calibration", "QKD", "noise",
            "error", "surface", "steane", "shor", "color", "toric",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let domain_stopwords = owned(&[
            "make", "need", "get", "thing", "good", "well", "go", "work", "way", "think", "know", "say",
            "take", "use", "find", "help", "give", "put", "keep", "see", "seem", "try", "start", "stop",
            "want", "like", "ask", "explain", "x", "com", "time", "post", "begin", "otim", "blog", "paper",
            "close", "people", "question", "answer", "example", "case", "part", "point", "problem",
            "solution", "issue", "idea", "method", "heard", "user", "comment", "timelin", "guy", "follow",
            "topic", "https", "professor", "lecture", "actually", "probably", "maybe", "really", "already",
            "just", "kind", "sort", "basically", "definitely", "obviously", "literally", "_", "install",
            "Paper", "Game",
        ]);

        Self {
            quantum_tools,
            quantum_algorithms,
            classical_algorithms,
            algorithm_aliases,
            algorithm_types,
            challenge_categories,
            lifecycle_stages,
            focus_tools,
            focus_algorithms,
            filter_keywords,
            boost_keywords,
            domain_stopwords,
        }
    }
}
